//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use proofpile::sources::Preset;
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(name = "proofpile", about = "mathematical corpus assembly tool.")]
/// Holds every command that is callable by the `proofpile` command.
pub enum ProofPile {
    #[structopt(about = "Join a Stack Exchange dump into questions with answers")]
    Mathoverflow(Mathoverflow),
    #[structopt(about = "Render the NaturalProofs ProofWiki dump")]
    Proofwiki(Proofwiki),
    #[structopt(about = "Delete files whose name does not match a pattern")]
    Prune(Prune),
    #[structopt(about = "Download a single file")]
    Download(Download),
    #[structopt(about = "Fetch files of a GitHub repository tree")]
    Github(Github),
    #[structopt(about = "List the shards of an arXiv source manifest")]
    ArxivManifest(ArxivManifest),
    #[structopt(about = "Unpack an arXiv source shard, keeping LaTeX files")]
    ArxivShard(ArxivShard),
    #[structopt(about = "Fetch a pinned source (napkin, cring, stacks, mizar, hol, afp, proofwiki)")]
    Preset(PresetCmd),
    #[structopt(about = "Train a byte-level BPE tokenizer on a corpus folder")]
    TokenizerTrain(TokenizerTrain),
    #[structopt(about = "Show the first and last merges of a tokenizer")]
    TokenizerInspect(TokenizerInspect),
    #[structopt(about = "Count the tokens each tokenizer needs for a corpus folder")]
    TokenizerCompare(TokenizerCompare),
}

#[derive(Debug, StructOpt)]
/// Mathoverflow command and parameters.
///
/// ```sh
/// proofpile mathoverflow data/mathoverflow.net stack-exchange/mathoverflow.jsonl.gz
/// ```
pub struct Mathoverflow {
    #[structopt(
        parse(from_os_str),
        help = "dump location (contains Comments.xml and Posts.xml)"
    )]
    pub src: PathBuf,
    #[structopt(
        parse(from_os_str),
        help = "destination json lines file (gzipped if ending in .gz)"
    )]
    pub dst: PathBuf,
}

#[derive(Debug, StructOpt)]
pub struct Proofwiki {
    #[structopt(parse(from_os_str), help = "naturalproofs_proofwiki.json location")]
    pub src: PathBuf,
    #[structopt(parse(from_os_str), help = "destination folder")]
    pub dst: PathBuf,
}

#[derive(Debug, StructOpt)]
pub struct Prune {
    #[structopt(parse(from_os_str), help = "folder to prune (recursively)")]
    pub dir: PathBuf,
    #[structopt(help = "pattern kept file names have to match (e.g. '\\.thy$|\\.tex$')")]
    pub pattern: String,
    #[structopt(long = "top-level", help = "also delete files directly in <dir>")]
    pub top_level: bool,
}

#[derive(Debug, StructOpt)]
pub struct Download {
    #[structopt(help = "url to download")]
    pub url: String,
    #[structopt(parse(from_os_str), help = "download destination")]
    pub dst: PathBuf,
}

#[derive(Debug, StructOpt)]
/// Github command and parameters.
///
/// Uses the token in `GITHUB_TOKEN` when set.
pub struct Github {
    #[structopt(help = "repository owner")]
    pub owner: String,
    #[structopt(help = "repository name")]
    pub repo: String,
    #[structopt(help = "tree sha")]
    pub tree: String,
    #[structopt(parse(from_os_str), help = "destination folder")]
    pub dst: PathBuf,
    #[structopt(
        short = "e",
        long = "ext",
        help = "kept extension (e.g. .tex). Can be repeated. Default is every file."
    )]
    pub extensions: Vec<String>,
    #[structopt(
        short = "x",
        long = "exclude",
        help = "excluded file name. Can be repeated."
    )]
    pub exclude: Vec<String>,
    #[structopt(
        long = "depth",
        default_value = "0",
        help = "folder depth of the fetched files"
    )]
    pub depth: usize,
    #[structopt(long = "mizar", help = "strip Mizar license headers")]
    pub mizar: bool,
}

#[derive(Debug, StructOpt)]
pub struct ArxivManifest {
    #[structopt(parse(from_os_str), help = "arXiv_src_manifest.xml location")]
    pub manifest: PathBuf,
}

#[derive(Debug, StructOpt)]
pub struct ArxivShard {
    #[structopt(parse(from_os_str), help = "folder containing the shard")]
    pub dir: PathBuf,
    #[structopt(help = "shard file name (e.g. arXiv_src_1001_001.tar)")]
    pub tarball: String,
    #[structopt(
        parse(from_os_str),
        long = "ids",
        help = "file of article ids to keep, one per line. Default is every article."
    )]
    pub ids: Option<PathBuf>,
}

#[derive(Debug, StructOpt)]
pub struct PresetCmd {
    #[structopt(help = "preset name")]
    pub preset: Preset,
    #[structopt(parse(from_os_str), help = "corpus root", default_value = ".")]
    pub root: PathBuf,
}

#[derive(Debug, StructOpt)]
/// Tokenizer training command and parameters.
///
/// ```sh
/// proofpile tokenizer-train corpus/ tokenizer_35000/tokenizer.json -e .tex -e .thy
/// ```
pub struct TokenizerTrain {
    #[structopt(parse(from_os_str), help = "corpus folder (read recursively)")]
    pub corpus: PathBuf,
    #[structopt(parse(from_os_str), help = "tokenizer.json destination")]
    pub dst: PathBuf,
    #[structopt(
        long = "vocab-size",
        default_value = "35000",
        help = "vocabulary size, special token and byte tokens included"
    )]
    pub vocab_size: usize,
    #[structopt(
        short = "e",
        long = "ext",
        help = "extension of the training files (e.g. .tex). Can be repeated. Default is every file."
    )]
    pub extensions: Vec<String>,
}

#[derive(Debug, StructOpt)]
pub struct TokenizerInspect {
    #[structopt(parse(from_os_str), help = "tokenizer.json location")]
    pub tokenizer: PathBuf,
    #[structopt(long = "last", default_value = "17", help = "number of last merges shown")]
    pub last: usize,
}

#[derive(Debug, StructOpt)]
/// Tokenizer comparison command and parameters.
///
/// Ratios are relative to the first tokenizer.
pub struct TokenizerCompare {
    #[structopt(parse(from_os_str), help = "corpus folder (read recursively)")]
    pub corpus: PathBuf,
    #[structopt(
        parse(from_os_str),
        required = true,
        help = "tokenizer.json locations"
    )]
    pub tokenizers: Vec<PathBuf>,
    #[structopt(
        short = "e",
        long = "ext",
        help = "extension of the counted files. Can be repeated. Default is every file."
    )]
    pub extensions: Vec<String>,
    #[structopt(parse(from_os_str), long = "report", help = "also write the report there")]
    pub report: Option<PathBuf>,
}
