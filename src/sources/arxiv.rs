/*! arXiv bulk sources.

arXiv sources are distributed as tarball shards listed in `arXiv_src_manifest.xml`.
A shard (`arXiv_src_1001_001.tar`) unpacks into a `1001/` folder holding one `<id>.gz` per article,
which is either a gzipped tarball (multi-file article) or a single gzipped LaTeX file.
!*/
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, error, info};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;

use super::archive;
use crate::error::Error;
use crate::processing::prune::prune_except;

pub const MANIFEST_FILE: &str = "arXiv_src_manifest.xml";

/// Kept extension once a shard has been unpacked.
const KEPT_FILES: &str = r"\.tex$";

/// One shard, as described in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path of the shard in the bucket (`src/arXiv_src_1001_001.tar`).
    pub filename: String,
    pub yymm: Option<String>,
    pub num_items: Option<u64>,
    pub size: Option<u64>,
    pub md5sum: Option<String>,
}

impl ManifestEntry {
    /// File name of the shard, without its bucket folder.
    pub fn tarball_name(&self) -> &str {
        self.filename.rsplit('/').next().unwrap_or(&self.filename)
    }
}

/// Parse the shard manifest.
pub fn parse_manifest<R: BufRead>(reader: R) -> Result<Vec<ManifestEntry>, Error> {
    let mut reader = Reader::from_reader(reader);
    let mut buf = Vec::with_capacity(1024);
    let mut entries = Vec::new();
    let mut current: Option<ManifestEntry> = None;
    let mut field: Option<Vec<u8>> = None;
    let mut text = String::new();

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                let name = e.name().as_ref().to_vec();
                if name == b"file" {
                    current = Some(ManifestEntry::default());
                } else if current.is_some() {
                    field = Some(name);
                    text.clear();
                }
            }
            Event::Text(ref e) => {
                if field.is_some() {
                    text.push_str(&e.unescape()?);
                }
            }
            Event::End(ref e) => {
                let name = e.name();
                if name.as_ref() == b"file" {
                    if let Some(entry) = current.take() {
                        entries.push(entry);
                    }
                } else if let (Some(entry), Some(f)) = (current.as_mut(), field.take()) {
                    let value = text.trim().to_string();
                    match f.as_slice() {
                        b"filename" => entry.filename = value,
                        b"yymm" => entry.yymm = Some(value),
                        b"num_items" => entry.num_items = value.parse().ok(),
                        b"size" => entry.size = value.parse().ok(),
                        b"md5sum" => entry.md5sum = Some(value),
                        _ => (),
                    }
                }
            }
            Event::Eof => break,
            _ => (),
        }
    }

    entries.retain(|e| !e.filename.is_empty());
    debug!("manifest lists {} shards", entries.len());
    Ok(entries)
}

pub fn parse_manifest_file(path: &Path) -> Result<Vec<ManifestEntry>, Error> {
    parse_manifest(BufReader::new(File::open(path)?))
}

/// Folder a shard unpacks into: the part of its name between the last two underscores.
///
/// `arXiv_src_1001_001.tar` gives `1001`.
pub fn shard_subdir(tarball_name: &str) -> Option<&str> {
    let name = tarball_name.rsplit('/').next()?;
    let last = name.rfind('_')?;
    let second_last = name[..last].rfind('_')?;
    Some(&name[second_last + 1..last])
}

/// What an article archive turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Member {
    /// Multi-file article, unpacked into this folder.
    Folder(PathBuf),
    /// Single LaTeX file.
    Tex(PathBuf),
}

fn is_tar(content: &[u8]) -> bool {
    content.len() > 262 && &content[257..262] == b"ustar"
}

/// Unpack an article `<id>.gz`, deleting the archive.
///
/// Tarballs go to an `<id>/` folder next to the archive, single files become `<id>.tex`.
pub fn unpack_member(path: &Path) -> Result<Member, Error> {
    let id = path
        .file_stem()
        .ok_or_else(|| Error::Custom(format!("no article id in {:?}", path)))?;
    let parent = path.parent().unwrap_or_else(|| Path::new("."));

    let mut content = Vec::new();
    GzDecoder::new(BufReader::new(File::open(path)?)).read_to_end(&mut content)?;

    let member = if is_tar(&content) {
        let dst = parent.join(id);
        archive::unpack_tar(content.as_slice(), &dst)?;
        Member::Folder(dst)
    } else {
        // not set_extension: new-style ids contain a dot
        let dst = parent.join(format!("{}.tex", id.to_string_lossy()));
        std::fs::write(&dst, content)?;
        Member::Tex(dst)
    };
    std::fs::remove_file(path)?;
    Ok(member)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShardStats {
    pub unpacked: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Unpack the shard `tarball_name` located in `dir`, then every article in it.
///
/// When `allowed` is given, only these article ids are unpacked. Everything that is not a LaTeX file is removed afterwards.
/// Articles failing to unpack are logged and counted, and do not stop the shard.
pub fn unpack_shard(
    dir: &Path,
    tarball_name: &str,
    allowed: Option<&HashSet<String>>,
) -> Result<ShardStats, Error> {
    let subdir = shard_subdir(tarball_name)
        .ok_or_else(|| Error::Custom(format!("unexpected shard name {}", tarball_name)))?;
    let tarball = dir.join(tarball_name);
    info!("unpacking shard {:?}", tarball);
    archive::unpack_tar(BufReader::new(File::open(&tarball)?), dir)?;

    let subpath = dir.join(subdir);
    let pattern = format!("{}/*.gz", subpath.to_string_lossy());
    let mut stats = ShardStats::default();

    for member in glob::glob(&pattern)? {
        let member = member?;
        let id = member
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        if allowed.map_or(false, |ids| !ids.contains(&id)) {
            stats.skipped += 1;
            continue;
        }
        match unpack_member(&member) {
            Ok(m) => {
                debug!("{} -> {:?}", id, m);
                stats.unpacked += 1;
            }
            Err(e) => {
                error!("could not unpack {}: {}", id, e);
                stats.failed += 1;
            }
        }
    }

    let pruned = prune_except(&subpath, &Regex::new(KEPT_FILES)?)?;
    info!(
        "[{}] {} articles unpacked, {} skipped, {} failed, {} tex files kept",
        subdir, stats.unpacked, stats.skipped, stats.failed, pruned.kept
    );
    Ok(stats)
}

/// Read an id allow-list, one id per line.
pub fn read_ids(path: &Path) -> Result<HashSet<String>, Error> {
    let f = BufReader::new(File::open(path)?);
    let mut ids = HashSet::new();
    for line in f.lines() {
        let line = line?;
        let id = line.trim();
        if !id.is_empty() {
            ids.insert(id.to_string());
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::{write::GzEncoder, Compression};

    use super::*;

    const MANIFEST: &str = r#"<?xml version='1.0' standalone='yes'?>
<arXivSRC>
  <file>
    <content_md5sum>cacbfede21d5dfef26f367ec99384546</content_md5sum>
    <filename>src/arXiv_src_0001_001.tar</filename>
    <first_item>astro-ph0001001</first_item>
    <last_item>quant-ph0001119</last_item>
    <md5sum>949ae880fbaf4649a02a6dd21d2d0a15</md5sum>
    <num_items>2364</num_items>
    <seq_num>1</seq_num>
    <size>225605507</size>
    <timestamp>2010-12-23 00:13:59</timestamp>
    <yymm>0001</yymm>
  </file>
  <file>
    <filename>src/arXiv_src_1001_002.tar</filename>
    <num_items>12</num_items>
    <yymm>1001</yymm>
  </file>
</arXivSRC>"#;

    fn gz(content: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(content).unwrap();
        enc.finish().unwrap()
    }

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, content) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder
                .append_data(&mut header, path, content.as_bytes())
                .unwrap();
        }
        builder.into_inner().unwrap()
    }

    #[test]
    fn manifest() {
        let entries = parse_manifest(MANIFEST.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "src/arXiv_src_0001_001.tar");
        assert_eq!(entries[0].tarball_name(), "arXiv_src_0001_001.tar");
        assert_eq!(entries[0].num_items, Some(2364));
        assert_eq!(entries[0].size, Some(225605507));
        assert_eq!(entries[1].yymm.as_deref(), Some("1001"));
        assert_eq!(entries[1].md5sum, None);
    }

    #[test]
    fn subdir() {
        assert_eq!(shard_subdir("arXiv_src_1001_001.tar"), Some("1001"));
        assert_eq!(shard_subdir("src/arXiv_src_0001_012.tar"), Some("0001"));
        assert_eq!(shard_subdir("shard.tar"), None);
    }

    #[test]
    fn single_file_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1001.0001.gz");
        std::fs::write(&path, gz(b"\\documentclass{article}")).unwrap();

        let member = unpack_member(&path).unwrap();
        let tex = dir.path().join("1001.0001.tex");
        assert_eq!(member, Member::Tex(tex.clone()));
        assert_eq!(
            std::fs::read_to_string(tex).unwrap(),
            "\\documentclass{article}"
        );
        assert!(!path.exists());
    }

    #[test]
    fn tarball_member() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1001.0002.gz");
        std::fs::write(
            &path,
            gz(&tarball(&[("main.tex", "\\input{sec}"), ("sec.tex", "hello")])),
        )
        .unwrap();

        let member = unpack_member(&path).unwrap();
        let folder = dir.path().join("1001.0002");
        assert_eq!(member, Member::Folder(folder.clone()));
        assert!(folder.join("main.tex").exists());
        assert!(folder.join("sec.tex").exists());
    }

    #[test]
    fn shard() {
        let dir = tempfile::tempdir().unwrap();
        let articles = tarball(&[("fig.eps", "%!PS"), ("paper.tex", "tex")]);
        let shard_tar = {
            let mut builder = tar::Builder::new(Vec::new());
            for (path, content) in [
                ("1001/1001.0001.gz", gz(b"\\begin{document}")),
                ("1001/1001.0002.gz", gz(&articles)),
                ("1001/1001.0003.gz", gz(b"not math")),
            ] {
                let mut header = tar::Header::new_gnu();
                header.set_size(content.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder
                    .append_data(&mut header, path, content.as_slice())
                    .unwrap();
            }
            builder.into_inner().unwrap()
        };
        std::fs::write(dir.path().join("arXiv_src_1001_001.tar"), shard_tar).unwrap();

        let allowed: HashSet<String> = ["1001.0001", "1001.0002"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let stats = unpack_shard(dir.path(), "arXiv_src_1001_001.tar", Some(&allowed)).unwrap();
        assert_eq!(
            stats,
            ShardStats {
                unpacked: 2,
                skipped: 1,
                failed: 0
            }
        );

        let sub = dir.path().join("1001");
        assert!(sub.join("1001.0001.tex").exists());
        assert!(sub.join("1001.0002/paper.tex").exists());
        assert!(!sub.join("1001.0002/fig.eps").exists());
        assert!(!sub.join("1001.0003.gz").exists());
    }

    #[test]
    fn ids_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.txt");
        std::fs::write(&path, "1001.0001\n\n  math0001001 \n").unwrap();
        let ids = read_ids(&path).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains("math0001001"));
    }
}
