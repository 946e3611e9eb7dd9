pub mod download;
pub mod error;
pub mod io;
pub mod mathoverflow;
pub mod processing;
pub mod sources;
pub mod tokenizer;
