/*! Sources of the corpus.

Each source is fetched, unpacked and filtered into plain-text/LaTeX files on disk.
[presets] lists the pinned sources, built upon the more generic [github], [archive] and [proofwiki] modules.
arXiv is handled separately by [arxiv], since its shards are fetched beforehand.
!*/
pub mod archive;
pub mod arxiv;
pub mod github;
pub mod presets;
pub mod proofwiki;

pub use presets::Preset;
