//! Error enum
use std::fmt;
use std::string::FromUtf8Error;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    Xml(quick_xml::Error),
    /// The document ended with this many elements still open.
    TruncatedDocument(usize),
    XmlAttr(quick_xml::events::attributes::AttrError),
    /// A required attribute is absent from a row.
    MissingField(&'static str),
    /// An attribute is present but cannot be coerced to its declared type.
    InvalidValue {
        field: &'static str,
        value: String,
    },
    UnknownPostType(i64),
    Utf8(FromUtf8Error),
    Serde(serde_json::Error),
    Http(reqwest::Error),
    Base64(base64::DecodeError),
    Regex(regex::Error),
    Glob(glob::GlobError),
    GlobPattern(glob::PatternError),
    /// Tokenizer training, loading or encoding failed.
    Tokenizer(String),
    Custom(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "io error: {}", e),
            Error::Xml(e) => write!(f, "xml parse error: {}", e),
            Error::TruncatedDocument(open) => write!(
                f,
                "unexpected end of document: {} unclosed elements",
                open
            ),
            Error::XmlAttr(e) => write!(f, "xml attribute error: {}", e),
            Error::MissingField(name) => write!(f, "Missing field {}", name),
            Error::InvalidValue { field, value } => {
                write!(f, "invalid value {:?} for field {}", value, field)
            }
            Error::UnknownPostType(code) => write!(f, "unknown post type id {}", code),
            Error::Utf8(e) => write!(f, "invalid utf-8: {}", e),
            Error::Serde(e) => write!(f, "json error: {}", e),
            Error::Http(e) => write!(f, "http error: {}", e),
            Error::Base64(e) => write!(f, "base64 error: {}", e),
            Error::Regex(e) => write!(f, "invalid pattern: {}", e),
            Error::Glob(e) => write!(f, "glob error: {}", e),
            Error::GlobPattern(e) => write!(f, "invalid glob pattern: {}", e),
            Error::Tokenizer(e) => write!(f, "tokenizer error: {}", e),
            Error::Custom(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Error {
        Error::Io(e)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(e: quick_xml::Error) -> Error {
        Error::Xml(e)
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(e: quick_xml::events::attributes::AttrError) -> Error {
        Error::XmlAttr(e)
    }
}

impl From<FromUtf8Error> for Error {
    fn from(e: FromUtf8Error) -> Error {
        Error::Utf8(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Error {
        Error::Serde(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Error {
        Error::Http(e)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Error {
        Error::Base64(e)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Error {
        Error::Regex(e)
    }
}

impl From<glob::GlobError> for Error {
    fn from(e: glob::GlobError) -> Error {
        Error::Glob(e)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for Error {
    fn from(e: Box<dyn std::error::Error + Send + Sync>) -> Error {
        Error::Tokenizer(e.to_string())
    }
}

impl From<glob::PatternError> for Error {
    fn from(e: glob::PatternError) -> Error {
        Error::GlobPattern(e)
    }
}

impl From<String> for Error {
    fn from(s: String) -> Error {
        Error::Custom(s)
    }
}
