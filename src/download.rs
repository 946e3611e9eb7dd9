/*! Blocking HTTP downloads.

Every source is fetched through a [Downloader], which holds the HTTP client and an optional API token.
!*/
use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use log::{debug, info};
use reqwest::blocking::{Client, Response};
use serde::de::DeserializeOwned;

use crate::error::Error;

const USER_AGENT: &str = concat!("proofpile/", env!("CARGO_PKG_VERSION"));

/// Environment variable holding a GitHub token.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

/// holds the http client that will make the requests.
pub struct Downloader {
    client: Client,
    token: Option<String>,
}

impl Downloader {
    pub fn new() -> Result<Self, Error> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            token: None,
        })
    }

    /// Authenticate requests with `token`.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Use the token found in [TOKEN_VAR], if any.
    pub fn with_env_token(self) -> Self {
        let token = std::env::var(TOKEN_VAR).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            debug!("no {} set, requests are unauthenticated", TOKEN_VAR);
        }
        self.with_token(token)
    }

    fn get(&self, url: &str) -> Result<Response, Error> {
        debug!("GET {}", url);
        let mut req = self.client.get(url);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        Ok(req.send()?.error_for_status()?)
    }

    /// Fetch `url` in memory.
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>, Error> {
        let mut resp = self.get(url)?;
        let expected = resp.content_length();
        let mut body = Vec::with_capacity(expected.unwrap_or(0) as usize);
        resp.read_to_end(&mut body)?;
        check_length(url, expected, body.len() as u64)?;
        Ok(body)
    }

    /// Fetch `url` and deserialize its JSON body.
    pub fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        let body = self.get_bytes(url)?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Stream `url` into `dst`, returning the number of written bytes.
    pub fn save_to(&self, url: &str, dst: &Path) -> Result<u64, Error> {
        info!("downloading {} to {:?}", url, dst);
        let mut resp = self.get(url)?;
        let expected = resp.content_length();
        let mut out = BufWriter::new(File::create(dst)?);
        let written = std::io::copy(&mut resp, &mut out)?;
        out.flush()?;
        check_length(url, expected, written)?;
        Ok(written)
    }
}

/// Fails when the server announced a length and we got something else.
fn check_length(url: &str, expected: Option<u64>, got: u64) -> Result<(), Error> {
    match expected {
        Some(expected) if expected != 0 && expected != got => Err(Error::Custom(format!(
            "incomplete download of {}: got {} bytes out of {}",
            url, got, expected
        ))),
        _ => Ok(()),
    }
}
