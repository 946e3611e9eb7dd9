//! # proofpile
//!
//! Tooling to assemble a corpus of mathematical documents (arXiv, formal libraries, textbooks, MathOverflow)
//! for language model training.
//!
//! This project can be used both as a tool to fetch and clean sources,
//! or as a lib to integrate the importers into other projects.
//!
//! ## Getting started
//!
//! ```sh
//! proofpile 0.1.0
//! mathematical corpus assembly tool.
//!
//! USAGE:
//!     proofpile <SUBCOMMAND>
//!
//! SUBCOMMANDS:
//!     arxiv-manifest    List the shards of an arXiv source manifest
//!     arxiv-shard       Unpack an arXiv source shard, keeping LaTeX files
//!     download          Download a single file
//!     github            Fetch files of a GitHub repository tree
//!     help              Prints this message or the help of the given subcommand(s)
//!     mathoverflow      Join a Stack Exchange dump into questions with answers
//!     preset            Fetch a pinned source (napkin, cring, stacks, mizar, hol, afp, proofwiki)
//!     proofwiki         Render the NaturalProofs ProofWiki dump
//!     prune             Delete files whose name does not match a pattern
//!     tokenizer-compare Count the tokens each tokenizer needs for a corpus folder
//!     tokenizer-inspect Show the first and last merges of a tokenizer
//!     tokenizer-train   Train a byte-level BPE tokenizer on a corpus folder
//! ```
//!
//! Logging is configured through `RUST_LOG` (e.g. `RUST_LOG=info`).
use log::{debug, info};
use regex::Regex;
use structopt::StructOpt;

use proofpile::download::Downloader;
use proofpile::error::Error;
use proofpile::mathoverflow;
use proofpile::processing::prune;
use proofpile::sources::github::{strip_mizar_header, BlobFilter, GithubClient, RepoTree};
use proofpile::sources::proofwiki::{self, NaturalProofs};
use proofpile::sources::{arxiv, presets};
use proofpile::tokenizer;

mod cli;

fn main() -> Result<(), Error> {
    env_logger::init();

    let opt = cli::ProofPile::from_args();
    debug!("cli args\n{:#?}", opt);

    match opt {
        cli::ProofPile::Mathoverflow(m) => {
            let import = mathoverflow::import(&m.src)?;
            mathoverflow::export(&import, &m.dst)?;
        }
        cli::ProofPile::Proofwiki(p) => {
            let dump = NaturalProofs::from_path(&p.src)?;
            proofwiki::write_corpus(&dump, &p.dst)?;
        }
        cli::ProofPile::Prune(p) => {
            let pattern = Regex::new(&p.pattern)?;
            if p.top_level {
                let removed = prune::remove_top_level_files(&p.dir)?;
                info!("removed {} top-level files", removed);
            }
            let stats = prune::prune_except(&p.dir, &pattern)?;
            info!("kept {} files, removed {}", stats.kept, stats.removed);
        }
        cli::ProofPile::Download(d) => {
            Downloader::new()?.save_to(&d.url, &d.dst)?;
        }
        cli::ProofPile::Github(g) => {
            let dl = Downloader::new()?.with_env_token();
            let repo = RepoTree {
                owner: g.owner,
                repo: g.repo,
                sha: g.tree,
            };
            let filter = BlobFilter {
                extensions: g.extensions,
                exclude: g.exclude,
                depth: g.depth,
            };
            let transform = if g.mizar {
                Some(strip_mizar_header as fn(&str) -> String)
            } else {
                None
            };
            GithubClient::new(&dl).fetch_tree(&repo, &filter, transform, &g.dst)?;
        }
        cli::ProofPile::ArxivManifest(a) => {
            for entry in arxiv::parse_manifest_file(&a.manifest)? {
                println!("{}", entry.filename);
            }
        }
        cli::ProofPile::ArxivShard(a) => {
            let ids = a.ids.as_deref().map(arxiv::read_ids).transpose()?;
            arxiv::unpack_shard(&a.dir, &a.tarball, ids.as_ref())?;
        }
        cli::ProofPile::Preset(p) => {
            let dl = Downloader::new()?.with_env_token();
            presets::fetch(p.preset, &dl, &p.root)?;
        }
        cli::ProofPile::TokenizerTrain(t) => {
            let files = tokenizer::corpus_files(&t.corpus, &t.extensions)?;
            tokenizer::train(&files, t.vocab_size, &t.dst)?;
        }
        cli::ProofPile::TokenizerInspect(t) => {
            let loaded = tokenizer::load(&t.tokenizer)?;
            print!("{}", tokenizer::inspect(&loaded, t.last)?);
        }
        cli::ProofPile::TokenizerCompare(t) => {
            let files = tokenizer::corpus_files(&t.corpus, &t.extensions)?;
            let tokenizers = t
                .tokenizers
                .iter()
                .map(|path| Ok((path.display().to_string(), tokenizer::load(path)?)))
                .collect::<Result<Vec<_>, Error>>()?;
            let report = tokenizer::format_report(&tokenizer::compare(&tokenizers, &files)?);
            if let Some(dst) = &t.report {
                std::fs::write(dst, &report)?;
            }
            print!("{}", report);
        }
    };
    Ok(())
}
