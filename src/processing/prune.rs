/*! Pruning of unpacked sources.

Sources come with build scripts, licenses, images and so on. Only files whose name matches a pattern
(e.g. `\.thy$|\.tex$`) are kept. Patterns are searched for in the file name, not anchored.
!*/
use std::path::Path;

use log::debug;
use regex::Regex;

use crate::error::Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PruneStats {
    pub kept: usize,
    pub removed: usize,
}

impl std::ops::AddAssign for PruneStats {
    fn add_assign(&mut self, rhs: Self) {
        self.kept += rhs.kept;
        self.removed += rhs.removed;
    }
}

fn matches(pattern: &Regex, path: &Path) -> bool {
    path.file_name()
        .map_or(false, |name| pattern.is_match(&name.to_string_lossy()))
}

/// Recursively delete every file of `dir` whose name does not match `pattern`.
///
/// Folders are walked but never deleted, even when they end up empty.
pub fn prune_except(dir: &Path, pattern: &Regex) -> Result<PruneStats, Error> {
    let mut stats = PruneStats::default();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            stats += prune_except(&path, pattern)?;
        } else if matches(pattern, &path) {
            stats.kept += 1;
        } else {
            debug!("removing {:?}", path);
            std::fs::remove_file(&path)?;
            stats.removed += 1;
        }
    }
    Ok(stats)
}

/// Delete the files located directly in `dir`, leaving folders untouched.
pub fn remove_top_level_files(dir: &Path) -> Result<usize, Error> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            debug!("removing {:?}", path);
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn touch(root: &Path, rel: &str) -> PathBuf {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(&p, "x").unwrap();
        p
    }

    #[test]
    fn recursive_prune() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        let thy = touch(root, "Foo/Bar.thy");
        let tex = touch(root, "Foo/document/root.tex");
        let root_file = touch(root, "Foo/ROOT");
        let png = touch(root, "Baz/pic.png");

        let re = Regex::new(r".*\.thy|.*\.tex").unwrap();
        let stats = prune_except(root, &re).unwrap();

        assert_eq!(stats, PruneStats { kept: 2, removed: 2 });
        assert!(thy.exists() && tex.exists());
        assert!(!root_file.exists() && !png.exists());
        assert!(root.join("Baz").is_dir());
    }

    #[test]
    fn top_level_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(root, "make.ml");
        touch(root, "hol.ml");
        let nested = touch(root, "Library/prime.ml");

        assert_eq!(remove_top_level_files(root).unwrap(), 2);
        assert!(nested.exists());
    }
}
