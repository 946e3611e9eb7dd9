/*! Repository snapshots distributed as `.tar.gz`.

Snapshots unpack into a single `<repo>-<sha>/` folder: [hoist] moves the interesting part of it
to the destination root and removes the rest.
!*/
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Component, Path};

use flate2::read::GzDecoder;
use log::{debug, info};

use crate::error::Error;

/// Unpack a gzipped tarball read from `reader` into `dst`.
pub fn unpack_tar_gz<R: Read>(reader: R, dst: &Path) -> Result<(), Error> {
    unpack_tar(GzDecoder::new(reader), dst)
}

/// Unpack a (non-compressed) tarball read from `reader` into `dst`.
pub fn unpack_tar<R: Read>(reader: R, dst: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(dst)?;
    let mut archive = tar::Archive::new(reader);
    archive.unpack(dst)?;
    Ok(())
}

/// Unpack the gzipped tarball at `src` into `dst`.
pub fn unpack_file(src: &Path, dst: &Path) -> Result<(), Error> {
    info!("unpacking {:?} into {:?}", src, dst);
    unpack_tar_gz(BufReader::new(File::open(src)?), dst)
}

/// Move the content of `dst/inner` into `dst`, then delete the top folder of `inner`.
///
/// `inner` is relative to `dst` (e.g. `mirror-afp-5a85b23/thys`). Returns the number of moved entries.
pub fn hoist(dst: &Path, inner: &Path) -> Result<usize, Error> {
    let top = match inner.components().next() {
        Some(Component::Normal(top)) => top.to_owned(),
        _ => {
            return Err(Error::Custom(format!(
                "cannot hoist {:?}: not a relative folder",
                inner
            )))
        }
    };

    let src = dst.join(inner);
    let mut moved = 0;
    for entry in std::fs::read_dir(&src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        debug!("moving {:?} to {:?}", entry.path(), target);
        std::fs::rename(entry.path(), target)?;
        moved += 1;
    }
    std::fs::remove_dir_all(dst.join(top))?;
    Ok(moved)
}
