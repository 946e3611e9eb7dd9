/*! Content processing

Post-processing of fetched sources, operating on files already on disk.
!*/
pub mod prune;

pub use prune::{prune_except, remove_top_level_files, PruneStats};
