/*! ProofWiki, as packaged by NaturalProofs.

The dump is a single JSON file. Each theorem (with its proofs) becomes a text file named after its id,
and all definitions are gathered in `defs.txt`.
!*/
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::error::Error;

pub const DUMP_URL: &str =
    "https://zenodo.org/record/4902289/files/naturalproofs_proofwiki.json?download=1";

pub const DEFINITIONS_FILE: &str = "defs.txt";

#[derive(Debug, Deserialize)]
pub struct NaturalProofs {
    pub dataset: Dataset,
}

#[derive(Debug, Deserialize)]
pub struct Dataset {
    pub theorems: Vec<Theorem>,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Theorem {
    pub id: u64,
    pub label: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub contents: Vec<String>,
    #[serde(default)]
    pub proofs: Vec<Proof>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Proof {
    #[serde(default)]
    pub contents: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Definition {
    pub label: String,
    #[serde(default)]
    pub contents: Vec<String>,
}

impl NaturalProofs {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, Error> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(src: &Path) -> Result<Self, Error> {
        Self::from_reader(BufReader::new(File::open(src)?))
    }
}

/// Render a theorem and its proofs. Theorems without statement give `None`.
pub fn render_theorem(thm: &Theorem) -> Option<String> {
    if thm.contents.is_empty() {
        return None;
    }
    let mut out = format!("\\section{{{}}}\n", thm.label);
    out += "Tags: ";
    out += &thm.categories.join(", ").replace('/', ": ");
    out += "\n\n";

    out += "\\begin{theorem}\n";
    out += &thm.contents.join("\n");
    out += "\n\\end{theorem}\n\n";

    for proof in &thm.proofs {
        out += "\\begin{proof}\n";
        out += &proof.contents.join("\n");
        out += "\n\\end{proof}\n\n";
    }
    Some(out)
}

/// Render every definition that has some content.
pub fn render_definitions(defs: &[Definition]) -> String {
    defs.iter()
        .filter(|d| !d.contents.is_empty())
        .map(|d| {
            format!(
                "\\begin{{definition}}[{}]\n{}\n\\end{{definition}}\n\n",
                d.label,
                d.contents.join("\n")
            )
        })
        .collect()
}

/// Write theorems and definitions of `dump` into `dst`, returning the number of written theorems.
pub fn write_corpus(dump: &NaturalProofs, dst: &Path) -> Result<usize, Error> {
    std::fs::create_dir_all(dst)?;
    let mut written = 0;
    for thm in &dump.dataset.theorems {
        if let Some(text) = render_theorem(thm) {
            std::fs::write(dst.join(format!("{}.txt", thm.id)), text)?;
            written += 1;
        }
    }
    std::fs::write(
        dst.join(DEFINITIONS_FILE),
        render_definitions(&dump.dataset.definitions),
    )?;
    info!(
        "wrote {} theorems and {} definitions to {:?}",
        written,
        dump.dataset.definitions.len(),
        dst
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DUMP: &str = r#"{"dataset": {
        "theorems": [
            {"id": 0, "type": "theorem", "label": "Sum of Odd Numbers",
             "categories": ["Number Theory/Odd Integers", "Sums"],
             "contents": ["The sum of two odd numbers", "is even."],
             "proofs": [{"contents": ["Let $a = 2m+1$", "and $b = 2n+1$."]}, {"contents": ["Trivial."]}],
             "refs": []},
            {"id": 1, "label": "Empty", "categories": [], "contents": [], "proofs": []}
        ],
        "definitions": [
            {"id": 5, "label": "Odd Integer", "contents": ["An integer not divisible by $2$."]},
            {"id": 6, "label": "Nothing", "contents": []}
        ],
        "others": []
    }}"#;

    fn dump() -> NaturalProofs {
        NaturalProofs::from_reader(DUMP.as_bytes()).unwrap()
    }

    #[test]
    fn theorem() {
        let d = dump();
        let text = render_theorem(&d.dataset.theorems[0]).unwrap();
        assert_eq!(
            text,
            "\\section{Sum of Odd Numbers}\n\
             Tags: Number Theory: Odd Integers, Sums\n\n\
             \\begin{theorem}\nThe sum of two odd numbers\nis even.\n\\end{theorem}\n\n\
             \\begin{proof}\nLet $a = 2m+1$\nand $b = 2n+1$.\n\\end{proof}\n\n\
             \\begin{proof}\nTrivial.\n\\end{proof}\n\n"
        );
    }

    #[test]
    fn empty_theorem_is_skipped() {
        assert!(render_theorem(&dump().dataset.theorems[1]).is_none());
    }

    #[test]
    fn definitions() {
        let text = render_definitions(&dump().dataset.definitions);
        assert_eq!(
            text,
            "\\begin{definition}[Odd Integer]\nAn integer not divisible by $2$.\n\\end{definition}\n\n"
        );
    }

    #[test]
    fn corpus() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(write_corpus(&dump(), dir.path()).unwrap(), 1);
        assert!(dir.path().join("0.txt").exists());
        assert!(!dir.path().join("1.txt").exists());
        assert!(dir.path().join(DEFINITIONS_FILE).exists());
    }
}
