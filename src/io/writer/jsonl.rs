//! JSON lines writer, gzipped when the destination ends in `.gz`.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use serde::Serialize;

use crate::error::Error;

enum Sink {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Sink::Plain(w) => w.write(buf),
            Sink::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Sink::Plain(w) => w.flush(),
            Sink::Gzip(w) => w.flush(),
        }
    }
}

/// Writes one serialized item per line.
///
/// [JsonlWriter::finish] has to be called for gzipped files to be complete.
pub struct JsonlWriter {
    sink: Sink,
    nb_written: usize,
}

impl JsonlWriter {
    /// Create (or truncate) `dst`.
    pub fn create(dst: &Path) -> Result<Self, Error> {
        let file = BufWriter::new(File::create(dst)?);
        let sink = if dst.extension().map_or(false, |ext| ext == "gz") {
            debug!("writing gzipped json lines to {:?}", dst);
            Sink::Gzip(GzEncoder::new(file, Compression::default()))
        } else {
            debug!("writing json lines to {:?}", dst);
            Sink::Plain(file)
        };
        Ok(Self {
            sink,
            nb_written: 0,
        })
    }

    pub fn write<T: Serialize>(&mut self, item: &T) -> Result<(), Error> {
        serde_json::to_writer(&mut self.sink, item)?;
        self.sink.write_all(b"\n")?;
        self.nb_written += 1;
        Ok(())
    }

    /// Flush and close the file, returning the number of written lines.
    pub fn finish(self) -> Result<usize, Error> {
        match self.sink {
            Sink::Plain(mut w) => w.flush()?,
            Sink::Gzip(w) => w.finish()?.flush()?,
        }
        Ok(self.nb_written)
    }
}
