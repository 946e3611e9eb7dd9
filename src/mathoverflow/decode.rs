/*! Record decoding.

Every record type lists its fields once in a [FromRow] implementation, pulling each one out of the [Row]
with the accessor matching how the field is declared:

- [Row::required]: fails with [Error::MissingField] when the attribute is absent,
- [Row::optional]: absent attributes decode to `None`,
- [Row::or]: absent attributes decode to a default value,
- [Row::with]: required attribute going through a custom decoding function.

Fields that are never read from the dump (derived fields) are just not looked up.
Value coercion is done by [FromAttr], so that a field whose type has no coercion does not compile.
!*/
use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::rows::Row;
use crate::error::Error;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Conversion from a raw attribute value.
pub trait FromAttr: Sized {
    /// `field` is the attribute name, used for error reporting.
    fn from_attr(field: &'static str, raw: &str) -> Result<Self, Error>;
}

/// Conversion from a whole row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> Result<Self, Error>;
}

impl FromAttr for i64 {
    fn from_attr(field: &'static str, raw: &str) -> Result<Self, Error> {
        raw.trim().parse().map_err(|_| invalid(field, raw))
    }
}

impl FromAttr for String {
    fn from_attr(_field: &'static str, raw: &str) -> Result<Self, Error> {
        Ok(raw.to_string())
    }
}

impl FromAttr for NaiveDateTime {
    fn from_attr(field: &'static str, raw: &str) -> Result<Self, Error> {
        parse_timestamp(raw).ok_or_else(|| invalid(field, raw))
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Dumps use local times without offset (`2009-09-28T00:23:04.440`).
/// Timestamps carrying an offset are converted to UTC, and bare dates are taken at midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Format a timestamp the way dumps do, keeping every significant fractional digit.
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn invalid(field: &'static str, raw: &str) -> Error {
    Error::InvalidValue {
        field,
        value: raw.to_string(),
    }
}

impl Row {
    pub fn required<T: FromAttr>(&self, name: &'static str) -> Result<T, Error> {
        match self.get(name) {
            Some(raw) => T::from_attr(name, raw),
            None => Err(Error::MissingField(name)),
        }
    }

    pub fn optional<T: FromAttr>(&self, name: &'static str) -> Result<Option<T>, Error> {
        self.get(name).map(|raw| T::from_attr(name, raw)).transpose()
    }

    pub fn or<T: FromAttr>(&self, name: &'static str, default: T) -> Result<T, Error> {
        Ok(self.optional(name)?.unwrap_or(default))
    }

    pub fn with<T, F>(&self, name: &'static str, decode: F) -> Result<T, Error>
    where
        F: FnOnce(&str) -> Result<T, Error>,
    {
        match self.get(name) {
            Some(raw) => decode(raw),
            None => Err(Error::MissingField(name)),
        }
    }
}
