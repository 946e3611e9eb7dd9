/*! Byte-level BPE tokenizers trained on the corpus.

A tokenizer is trained on the files of a corpus folder and saved in the `tokenizer.json` format,
so that it can be loaded back with [Tokenizer::from_file] (or any other `tokenizers` binding).

Once trained, a tokenizer can be inspected (which merges come first and last),
and several tokenizers can be compared on the number of tokens they need for the same corpus.
!*/
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use log::{debug, info};
use rayon::prelude::*;
use tokenizers::models::bpe::{BpeTrainerBuilder, BPE};
use tokenizers::normalizers::NormalizerWrapper;
use tokenizers::pre_tokenizers::byte_level::ByteLevel;
use tokenizers::{AddedToken, Tokenizer, TokenizerBuilder};

use crate::error::Error;

/// Separates documents, and is the only special token.
pub const END_OF_TEXT: &str = "<|endoftext|>";

/// The special token followed by the 256 byte tokens.
pub const BASE_VOCAB_SIZE: usize = 257;

/// Number of merges shown after the base vocabulary by [inspect].
const FIRST_MERGES: usize = 23;

/// Files under `root`, recursively, keeping only `extensions` (with the dot) if not empty.
/// Files are sorted by path.
pub fn corpus_files(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, Error> {
    let pattern = root.join("**").join("*");
    let pattern = pattern
        .to_str()
        .ok_or_else(|| Error::Custom(format!("non utf-8 corpus path {:?}", root)))?;

    let mut files = Vec::new();
    for path in glob::glob(pattern)? {
        let path = path?;
        if !path.is_file() {
            continue;
        }
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if extensions.is_empty() || extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
            files.push(path);
        }
    }
    files.sort();
    debug!("{} corpus files under {:?}", files.len(), root);
    Ok(files)
}

/// Train a byte-level BPE tokenizer of (at most) `vocab_size` tokens on `files`,
/// and save it at `dst`.
///
/// Returns the size of the learnt vocabulary, which is smaller than `vocab_size`
/// when the corpus does not have enough distinct pairs to merge.
pub fn train(files: &[PathBuf], vocab_size: usize, dst: &Path) -> Result<usize, Error> {
    if files.is_empty() {
        return Err(Error::Custom("no file to train a tokenizer on".to_string()));
    }
    let files = files
        .iter()
        .map(|f| {
            f.to_str()
                .map(str::to_string)
                .ok_or_else(|| Error::Custom(format!("non utf-8 path {:?}", f)))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let mut trainer = BpeTrainerBuilder::new()
        .show_progress(log::log_enabled!(log::Level::Info))
        .vocab_size(vocab_size)
        .min_frequency(0)
        .special_tokens(vec![AddedToken::from(END_OF_TEXT, true)])
        .initial_alphabet(ByteLevel::alphabet())
        .build();

    // no prefix space, so that decoding gives back the original text
    let byte_level = ByteLevel::default().add_prefix_space(false);
    let mut tokenizer =
        TokenizerBuilder::<BPE, NormalizerWrapper, ByteLevel, ByteLevel, ByteLevel>::new()
            .with_model(BPE::default())
            .with_normalizer(None)
            .with_pre_tokenizer(Some(byte_level))
            .with_post_processor(Some(byte_level))
            .with_decoder(Some(byte_level))
            .build()?;

    info!(
        "training a {} tokens vocabulary on {} files",
        vocab_size,
        files.len()
    );
    tokenizer.train_from_files(&mut trainer, files)?;

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dst_str = dst
        .to_str()
        .ok_or_else(|| Error::Custom(format!("non utf-8 path {:?}", dst)))?;
    tokenizer.save(dst_str, false)?;

    let learnt = tokenizer.get_vocab_size(true);
    info!("saved a {} tokens vocabulary to {:?}", learnt, dst);
    Ok(learnt)
}

/// Load a tokenizer saved in the `tokenizer.json` format.
pub fn load(path: &Path) -> Result<Tokenizer, Error> {
    Ok(Tokenizer::from_file(path)?)
}

/// A token with its id, decoded back to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabEntry {
    pub id: u32,
    pub text: String,
}

/// What a vocabulary learnt first and last.
#[derive(Debug, Clone, Default)]
pub struct VocabSummary {
    pub size: usize,
    /// First merges after the base vocabulary that are more than one visible character.
    pub first_words: Vec<VocabEntry>,
    /// Number of first merges that decode to (at most one character of) whitespace.
    pub whitespace_tokens: usize,
    /// Last merges of the vocabulary.
    pub last_words: Vec<VocabEntry>,
}

impl std::fmt::Display for VocabSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "vocabulary size: {}", self.size)?;
        writeln!(f, "first words after base vocabulary")?;
        for entry in &self.first_words {
            writeln!(f, "`{}` at index {}", entry.text, entry.id)?;
        }
        writeln!(f, "\nNumber of whitespace tokens: {}", self.whitespace_tokens)?;
        writeln!(f, "Last words in the vocabulary:")?;
        for entry in &self.last_words {
            writeln!(f, "`{}` at index {}", entry.text, entry.id)?;
        }
        Ok(())
    }
}

/// Summarize the vocabulary of `tokenizer`, keeping `last` tokens from its end.
pub fn inspect(tokenizer: &Tokenizer, last: usize) -> Result<VocabSummary, Error> {
    let mut vocab: Vec<(String, u32)> = tokenizer.get_vocab(false).into_iter().collect();
    vocab.sort_by_key(|(_, id)| *id);

    let decode = |id: u32| -> Result<VocabEntry, Error> {
        Ok(VocabEntry {
            id,
            text: tokenizer.decode(&[id], false)?,
        })
    };

    let mut summary = VocabSummary {
        size: vocab.len(),
        ..Default::default()
    };
    let merges = vocab.get(BASE_VOCAB_SIZE..).unwrap_or_default();
    for (_, id) in merges.iter().take(FIRST_MERGES) {
        let entry = decode(*id)?;
        if entry.text.trim().chars().count() > 1 {
            summary.first_words.push(entry);
        } else {
            summary.whitespace_tokens += 1;
        }
    }
    let skip = merges.len().saturating_sub(last);
    for (_, id) in merges.iter().skip(skip) {
        summary.last_words.push(decode(*id)?);
    }
    Ok(summary)
}

/// Number of tokens `tokenizer` needs to encode `files`.
/// Files are read as UTF-8, replacing invalid sequences.
pub fn count_tokens(tokenizer: &Tokenizer, files: &[PathBuf]) -> Result<usize, Error> {
    let counts = files
        .par_iter()
        .map(|path| -> Result<usize, Error> {
            let text = std::fs::read(path)?;
            let encoding = tokenizer.encode(String::from_utf8_lossy(&text).as_ref(), false)?;
            Ok(encoding.len())
        })
        .collect::<Result<Vec<usize>, Error>>()?;
    Ok(counts.into_iter().sum())
}

/// Count the tokens each of `tokenizers` needs for `files`, keeping their order.
pub fn compare(
    tokenizers: &[(String, Tokenizer)],
    files: &[PathBuf],
) -> Result<Vec<(String, usize)>, Error> {
    let mut counts = Vec::with_capacity(tokenizers.len());
    for (name, tokenizer) in tokenizers {
        let count = count_tokens(tokenizer, files)?;
        info!("[{}] {} tokens", name, count);
        counts.push((name.clone(), count));
    }
    Ok(counts)
}

/// One line per tokenizer, with its token count and its ratio to the first tokenizer's.
pub fn format_report(counts: &[(String, usize)]) -> String {
    let reference = counts.first().map(|(_, c)| *c).filter(|c| *c > 0);
    let mut report = String::new();
    for (name, count) in counts {
        let _ = match reference {
            Some(r) => writeln!(
                report,
                "{}: {} tokens ({:.3} of {})",
                name,
                count,
                *count as f64 / r as f64,
                counts[0].0
            ),
            None => writeln!(report, "{}: {} tokens", name, count),
        };
    }
    report
}
