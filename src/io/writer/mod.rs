//! Writers for processed records.
mod jsonl;

pub use jsonl::JsonlWriter;
