/*! MathOverflow (and other Stack Exchange sites) importer.

Turns a Stack Exchange data dump into questions carrying their comments and answers.

1. Get the `mathoverflow.net.7z` archive of the Stack Exchange data dump,
2. Extract it into a folder (usually `mathoverflow.net`),
3. Call [import] on that folder.

```no_run
use std::path::Path;
use proofpile::mathoverflow;

let import = mathoverflow::import(Path::new("data/mathoverflow.net")).unwrap();
for (id, question) in &import.questions {
    println!("{}: {:?} ({} answers)", id, question.title, question.answers.as_ref().map_or(0, Vec::len));
}
```
!*/
mod decode;
mod index;
mod join;
mod rows;
mod types;

use std::path::{Path, PathBuf};

use log::info;

pub use decode::{format_timestamp, parse_timestamp, FromAttr, FromRow};
pub use index::CommentIndex;
pub use join::{join, Import};
pub use rows::{Row, RowReader};
pub use types::{Comment, Post, PostType};

use crate::error::Error;
use crate::io::writer::JsonlWriter;

pub const COMMENTS_FILE: &str = "Comments.xml";
pub const POSTS_FILE: &str = "Posts.xml";

/// Import the dump located in `dir`.
///
/// Comments are indexed first, then posts are streamed and joined.
pub fn import(dir: &Path) -> Result<Import, Error> {
    let comments_path = dump_file(dir, COMMENTS_FILE)?;
    let posts_path = dump_file(dir, POSTS_FILE)?;

    info!("indexing comments from {:?}", comments_path);
    let comments = CommentIndex::from_rows(RowReader::from_path(&comments_path)?)?;

    info!("joining posts from {:?}", posts_path);
    join(RowReader::from_path(&posts_path)?, comments)
}

/// Write questions as JSON lines, in id order.
///
/// Returns the number of written questions.
pub fn export(import: &Import, dst: &Path) -> Result<usize, Error> {
    let mut writer = JsonlWriter::create(dst)?;
    for question in import.questions.values() {
        writer.write(question)?;
    }
    let written = writer.finish()?;
    info!("wrote {} questions to {:?}", written, dst);
    Ok(written)
}

/// `name` in `dir`, or its gzipped version.
fn dump_file(dir: &Path, name: &str) -> Result<PathBuf, Error> {
    let plain = dir.join(name);
    if plain.exists() {
        return Ok(plain);
    }
    let gz = dir.join(format!("{}.gz", name));
    if gz.exists() {
        return Ok(gz);
    }
    Err(Error::Custom(format!(
        "no {} found in {:?}",
        name, dir
    )))
}
