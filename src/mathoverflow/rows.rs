/*! XML row stream.

Stack Exchange dumps store one database row per `<row .../>` element, with every column held in an attribute.
[RowReader] walks the document event by event, so that multi-gigabyte dumps never have to be held in memory.
!*/
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::Error;

const ROW_TAG: &[u8] = b"row";

/// Raw attributes of a single row element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    attrs: HashMap<String, String>,
}

impl Row {
    /// Get the raw value of attribute `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attrs.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.attrs.remove(name)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    fn from_element(element: &BytesStart) -> Result<Self, Error> {
        let mut attrs = HashMap::new();
        for attr in element.attributes() {
            let attr = attr?;
            let key = String::from_utf8(attr.key.as_ref().to_vec())?;
            let value = attr.unescape_value()?.into_owned();
            attrs.insert(key, value);
        }
        Ok(Self { attrs })
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            attrs: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Forward-only iterator over the rows of an XML dump.
///
/// Yields rows in document order. The first parse error is yielded and ends the stream.
pub struct RowReader<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    /// Number of currently open elements.
    depth: usize,
    done: bool,
}

impl RowReader<Box<dyn BufRead>> {
    /// Open a dump file. Files ending in `.gz` are decompressed on the fly.
    pub fn from_path(path: &Path) -> Result<Self, Error> {
        debug!("opening row stream on {:?}", path);
        let file = File::open(path)?;
        let inner: Box<dyn BufRead> = if path.extension().map_or(false, |ext| ext == "gz") {
            Box::new(BufReader::with_capacity(
                1024 * 1024,
                MultiGzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(1024 * 1024, file))
        };
        Ok(Self::new(inner))
    }
}

impl<R: BufRead> RowReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: Reader::from_reader(inner),
            buf: Vec::with_capacity(8192),
            depth: 0,
            done: false,
        }
    }

    fn next_row(&mut self) -> Result<Option<Row>, Error> {
        loop {
            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf)? {
                Event::Start(ref e) => {
                    self.depth += 1;
                    if e.name().as_ref() == ROW_TAG {
                        return Row::from_element(e).map(Some);
                    }
                }
                Event::Empty(ref e) if e.name().as_ref() == ROW_TAG => {
                    return Row::from_element(e).map(Some);
                }
                Event::End(_) => self.depth = self.depth.saturating_sub(1),
                // quick-xml does not check that every element has been closed
                Event::Eof if self.depth > 0 => return Err(Error::TruncatedDocument(self.depth)),
                Event::Eof => return Ok(None),
                _ => (),
            }
        }
    }
}

impl<R: BufRead> Iterator for RowReader<R> {
    type Item = Result<Row, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
