/*! Files of a GitHub repository, at a pinned tree.

Trees are listed through the git trees API (`/repos/{owner}/{repo}/git/trees/{sha}`),
then each selected blob is fetched and base64-decoded. Blobs are downloaded concurrently.
!*/
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use serde::Deserialize;

use crate::download::Downloader;
use crate::error::Error;

pub const API_URL: &str = "https://api.github.com";

/// Mizar articles carry their license on these lines.
const MIZAR_HEADER: std::ops::RangeInclusive<usize> = 2..=12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    Commit,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Tree {
    pub sha: String,
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

#[derive(Debug, Deserialize)]
struct Blob {
    content: String,
    encoding: String,
}

/// A repository at a given tree sha.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoTree {
    pub owner: String,
    pub repo: String,
    pub sha: String,
}

/// Which blobs of a tree are kept.
#[derive(Debug, Clone, Default)]
pub struct BlobFilter {
    /// Kept extensions (with the dot, e.g. `.tex`). Empty means every extension.
    pub extensions: Vec<String>,
    /// Blob names that are never kept (e.g. `fdl.tex`).
    pub exclude: Vec<String>,
    /// Nesting level of the kept blobs: 0 keeps top-level blobs only,
    /// 1 keeps the blobs of top-level folders, and so on.
    pub depth: usize,
}

impl BlobFilter {
    pub fn accepts(&self, entry: &TreeEntry) -> bool {
        entry.kind == EntryKind::Blob
            && !self.exclude.iter().any(|name| name == &entry.path)
            && (self.extensions.is_empty()
                || self.extensions.iter().any(|ext| entry.path.ends_with(ext.as_str())))
    }
}

/// Lists the tree found at an API url.
pub trait TreeSource {
    fn tree_at(&self, url: &str) -> Result<Tree, Error>;
}

/// Content transformation applied to each fetched file.
pub type Transform = fn(&str) -> String;

pub struct GithubClient<'a> {
    dl: &'a Downloader,
    api: String,
}

impl<'a> GithubClient<'a> {
    pub fn new(dl: &'a Downloader) -> Self {
        Self {
            dl,
            api: API_URL.to_string(),
        }
    }

    /// Use another API endpoint (GitHub Enterprise, mirrors).
    pub fn with_api(mut self, api: impl Into<String>) -> Self {
        self.api = api.into();
        self
    }

    pub fn tree(&self, repo: &RepoTree) -> Result<Tree, Error> {
        let url = format!(
            "{}/repos/{}/{}/git/trees/{}",
            self.api.trim_end_matches('/'),
            repo.owner,
            repo.repo,
            repo.sha
        );
        self.tree_at(&url)
    }

    /// Fetch and decode the blob at `url`.
    pub fn blob(&self, url: &str) -> Result<Vec<u8>, Error> {
        let blob: Blob = self.dl.get_json(url)?;
        decode_content(&blob.encoding, &blob.content)
    }

    /// List the blobs of `tree` that `filter` keeps, descending `filter.depth` levels of folders.
    pub fn select_blobs(&self, tree: Tree, filter: &BlobFilter) -> Result<Vec<TreeEntry>, Error> {
        select_nested(self, tree, filter, filter.depth)
    }

    /// Fetch the selected files of `repo` into `dst`, applying `transform` on their content.
    ///
    /// Files are written flat, under their name in their own folder.
    /// Every failing file is logged, and an error is returned if there has been at least one.
    pub fn fetch_tree(
        &self,
        repo: &RepoTree,
        filter: &BlobFilter,
        transform: Option<Transform>,
        dst: &Path,
    ) -> Result<usize, Error> {
        std::fs::create_dir_all(dst)?;
        let tree = self.tree(repo)?;
        let blobs = self.select_blobs(tree, filter)?;
        info!(
            "[{}/{}] fetching {} files into {:?}",
            repo.owner,
            repo.repo,
            blobs.len(),
            dst
        );

        let errors: Vec<(String, Error)> = blobs
            .par_iter()
            .filter_map(|entry| {
                self.fetch_blob(entry, transform, dst)
                    .err()
                    .map(|e| (entry.path.clone(), e))
            })
            .collect();

        if !errors.is_empty() {
            for (path, error) in &errors {
                error!("[{}/{}] {}: {}", repo.owner, repo.repo, path, error);
            }
            return Err(Error::Custom(format!(
                "{} out of {} files of {}/{} could not be fetched: see previous messages.",
                errors.len(),
                blobs.len(),
                repo.owner,
                repo.repo
            )));
        }
        Ok(blobs.len())
    }

    fn fetch_blob(
        &self,
        entry: &TreeEntry,
        transform: Option<Transform>,
        dst: &Path,
    ) -> Result<(), Error> {
        let content = self.blob(&entry.url)?;
        let content = match transform {
            Some(f) => f(&String::from_utf8(content)?).into_bytes(),
            None => content,
        };
        std::fs::write(dst.join(&entry.path), content)?;
        Ok(())
    }
}

impl TreeSource for GithubClient<'_> {
    fn tree_at(&self, url: &str) -> Result<Tree, Error> {
        let tree: Tree = self.dl.get_json(url)?;
        if tree.truncated {
            warn!("tree {} is truncated, some files will be missing", tree.sha);
        }
        Ok(tree)
    }
}

/// Keep the blobs accepted by `filter` found `depth` folders below `tree`.
/// Subtrees are listed through `source`.
pub fn select_nested<S: TreeSource + ?Sized>(
    source: &S,
    tree: Tree,
    filter: &BlobFilter,
    depth: usize,
) -> Result<Vec<TreeEntry>, Error> {
    if depth == 0 {
        return Ok(select_blobs(tree.tree, filter));
    }
    let mut selected = Vec::new();
    for entry in tree.tree.into_iter().filter(|e| e.kind == EntryKind::Tree) {
        debug!("descending into {}", entry.path);
        let subtree = source.tree_at(&entry.url)?;
        selected.extend(select_nested(source, subtree, filter, depth - 1)?);
    }
    Ok(selected)
}

/// Keep the entries accepted by `filter`.
pub fn select_blobs(entries: Vec<TreeEntry>, filter: &BlobFilter) -> Vec<TreeEntry> {
    entries.into_iter().filter(|e| filter.accepts(e)).collect()
}

/// Decode blob content. The API wraps base64 content on several lines.
pub fn decode_content(encoding: &str, content: &str) -> Result<Vec<u8>, Error> {
    match encoding {
        "base64" => {
            let compact: String = content.split_whitespace().collect();
            Ok(STANDARD.decode(compact)?)
        }
        "utf-8" => Ok(content.as_bytes().to_vec()),
        other => Err(Error::Custom(format!("unknown blob encoding {}", other))),
    }
}

/// Remove the license header of a Mizar article.
pub fn strip_mizar_header(src: &str) -> String {
    src.split('\n')
        .enumerate()
        .filter(|(i, _)| !MIZAR_HEADER.contains(i))
        .map(|(_, line)| line)
        .collect::<Vec<_>>()
        .join("\n")
}
