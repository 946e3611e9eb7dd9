/*! Pinned sources of the corpus.

Each preset fetches a fixed revision of a source into its own folder of the corpus root
(`books/`, `formal/`), and keeps only the files that hold mathematics.
!*/
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::info;
use regex::Regex;

use super::archive;
use super::github::{strip_mizar_header, BlobFilter, GithubClient, RepoTree, Transform};
use super::proofwiki::{self, NaturalProofs};
use crate::download::Downloader;
use crate::error::Error;
use crate::processing::prune::{prune_except, remove_top_level_files};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Napkin,
    Cring,
    Stacks,
    Mizar,
    HolLight,
    Afp,
    ProofWiki,
}

pub struct GithubSource {
    pub owner: &'static str,
    pub repo: &'static str,
    pub tree: &'static str,
    pub extensions: &'static [&'static str],
    pub exclude: &'static [&'static str],
    pub depth: usize,
    pub transform: Option<Transform>,
}

pub struct TarballSource {
    pub url: &'static str,
    /// Folder of the snapshot whose content is kept.
    pub inner: &'static str,
    /// Kept file names.
    pub keep: &'static str,
    /// Top-level files are build scripts, not mathematics.
    pub drop_top_level: bool,
}

pub enum Source {
    Github(GithubSource),
    Tarball(TarballSource),
    NaturalProofs(&'static str),
}

impl Preset {
    pub const ALL: [Preset; 7] = [
        Preset::Napkin,
        Preset::Cring,
        Preset::Stacks,
        Preset::Mizar,
        Preset::HolLight,
        Preset::Afp,
        Preset::ProofWiki,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Napkin => "napkin",
            Preset::Cring => "cring",
            Preset::Stacks => "stacks",
            Preset::Mizar => "mizar",
            Preset::HolLight => "hol",
            Preset::Afp => "afp",
            Preset::ProofWiki => "proofwiki",
        }
    }

    /// Destination, relative to the corpus root.
    pub fn dir(&self) -> &'static str {
        match self {
            Preset::Napkin => "books/napkin",
            Preset::Cring => "books/cring",
            Preset::Stacks => "books/stacks",
            Preset::Mizar => "formal/mizar",
            Preset::HolLight => "formal/hol",
            Preset::Afp => "formal/afp",
            Preset::ProofWiki => "books/proofwiki",
        }
    }

    pub fn source(&self) -> Source {
        match self {
            // chapters sit one folder deep
            Preset::Napkin => Source::Github(GithubSource {
                owner: "vEnhance",
                repo: "napkin",
                tree: "4f56c2ef5d0faf132ee14c15d96fb0f134d58bf0",
                extensions: &[],
                exclude: &[],
                depth: 1,
                transform: None,
            }),
            Preset::Cring => Source::Github(GithubSource {
                owner: "aisejohan",
                repo: "cring",
                tree: "2db2618ff70831002aeefbb16885ee42d5198db3",
                extensions: &[],
                exclude: &["license.tex"],
                depth: 0,
                transform: None,
            }),
            Preset::Stacks => Source::Github(GithubSource {
                owner: "stacks",
                repo: "stacks-project",
                tree: "0a847ff5e41b47795be075e130e7810173b35933",
                extensions: &[".tex"],
                exclude: &["fdl.tex"],
                depth: 0,
                transform: None,
            }),
            Preset::Mizar => Source::Github(GithubSource {
                owner: "zhangir-azerbayev",
                repo: "mizar-mirror",
                tree: "ce8e9735fd7a4d3488069c48da76bc622aec46ec",
                extensions: &[],
                exclude: &[],
                depth: 0,
                transform: Some(strip_mizar_header),
            }),
            Preset::HolLight => Source::Tarball(TarballSource {
                url: "https://github.com/jrh13/hol-light/archive/538c62f.tar.gz",
                inner: "hol-light-538c62f7cdb0df146752c83f85fa672ae3906b03",
                keep: r".*\.ml|.*\.doc",
                drop_top_level: true,
            }),
            Preset::Afp => Source::Tarball(TarballSource {
                url: "https://github.com/isabelle-prover/mirror-afp-2021-1/archive/5a85b23.tar.gz",
                inner: "mirror-afp-2021-1-5a85b23fb030c472d9a7b2d65a61e428f4eb8233/thys",
                keep: r".*\.thy|.*\.tex",
                drop_top_level: false,
            }),
            Preset::ProofWiki => Source::NaturalProofs(proofwiki::DUMP_URL),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .iter()
            .find(|p| p.name() == s)
            .copied()
            .ok_or_else(|| {
                let names: Vec<&str> = Preset::ALL.iter().map(Preset::name).collect();
                Error::Custom(format!(
                    "unknown preset {} (expected one of {})",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// Fetch `preset` under `root`.
pub fn fetch(preset: Preset, dl: &Downloader, root: &Path) -> Result<(), Error> {
    let dst = root.join(preset.dir());
    std::fs::create_dir_all(&dst)?;
    info!("[{}] fetching into {:?}", preset, dst);

    match preset.source() {
        Source::Github(src) => {
            let repo = RepoTree {
                owner: src.owner.to_string(),
                repo: src.repo.to_string(),
                sha: src.tree.to_string(),
            };
            let filter = BlobFilter {
                extensions: src.extensions.iter().map(|s| s.to_string()).collect(),
                exclude: src.exclude.iter().map(|s| s.to_string()).collect(),
                depth: src.depth,
            };
            GithubClient::new(dl).fetch_tree(&repo, &filter, src.transform, &dst)?;
        }
        Source::Tarball(src) => {
            let tarball = dst.join(format!("{}.tar.gz", preset.name()));
            dl.save_to(src.url, &tarball)?;
            archive::unpack_file(&tarball, &dst)?;
            std::fs::remove_file(&tarball)?;
            clean_snapshot(&src, &dst)?;
        }
        Source::NaturalProofs(url) => {
            let body = dl.get_bytes(url)?;
            let dump = NaturalProofs::from_reader(body.as_slice())?;
            proofwiki::write_corpus(&dump, &dst)?;
        }
    }

    info!("[{}] done", preset);
    Ok(())
}

/// Hoist and prune an unpacked snapshot.
pub fn clean_snapshot(src: &TarballSource, dst: &Path) -> Result<(), Error> {
    archive::hoist(dst, Path::new(src.inner))?;
    if src.drop_top_level {
        remove_top_level_files(dst)?;
    }
    let stats = prune_except(dst, &Regex::new(src.keep)?)?;
    info!(
        "{:?}: kept {} files, removed {}",
        dst, stats.kept, stats.removed
    );
    Ok(())
}
