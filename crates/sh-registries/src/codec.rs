//! Pipe-delimited line codec
//!
//! One record per line, fields separated by `|`. Field values are escaped so
//! that free text may contain the separator or line breaks:
//!
//! | raw        | encoded |
//! |------------|---------|
//! | `\`        | `\\`    |
//! | `\|`       | `\|`    |
//! | newline    | `\n`    |
//! | CR         | `\r`    |
//!
//! A line without backslashes decodes exactly as the legacy unescaped format.

use std::borrow::Cow;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use sh_core::{timestamp_from_epoch, NULL_REF};
use thiserror::Error;

/// Field separator
pub const SEPARATOR: char = '|';

const ESCAPE: char = '\\';

/// Errors raised while decoding a record line
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CodecError {
    #[error("empty record")]
    Empty,

    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: String, found: usize },

    #[error("invalid number in field '{field}': {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("invalid flag in field '{field}': {value:?} (expected 0 or 1)")]
    InvalidFlag { field: &'static str, value: String },

    #[error("unknown code in field '{field}': {value:?}")]
    InvalidEnum { field: &'static str, value: String },

    #[error("invalid timestamp in field '{field}': {value:?}")]
    InvalidTimestamp { field: &'static str, value: String },

    #[error("invalid entry in field '{field}': {value:?}")]
    InvalidEntry { field: &'static str, value: String },

    #[error("line ends inside an escape sequence")]
    UnterminatedEscape,

    #[error("duplicate id '{0}'")]
    DuplicateId(String),
}

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Escape a field value for writing
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if !value.contains([ESCAPE, SEPARATOR, '\n', '\r']) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        match c {
            ESCAPE => out.push_str("\\\\"),
            SEPARATOR => out.push_str("\\|"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Join raw field values into one encoded line
pub fn join_fields<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut line = String::new();
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            line.push(SEPARATOR);
        }
        line.push_str(&escape_field(field.as_ref()));
    }
    line
}

/// Split an encoded line into unescaped field values
///
/// Unknown escape sequences are kept verbatim, so stray backslashes in legacy
/// files survive a load.
pub fn split_fields(line: &str) -> CodecResult<Vec<String>> {
    if line.is_empty() {
        return Err(CodecError::Empty);
    }

    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            ESCAPE => match chars.next() {
                Some(ESCAPE) => current.push(ESCAPE),
                Some(SEPARATOR) => current.push(SEPARATOR),
                Some('n') => current.push('\n'),
                Some('r') => current.push('\r'),
                Some(other) => {
                    current.push(ESCAPE);
                    current.push(other);
                }
                None => return Err(CodecError::UnterminatedEscape),
            },
            SEPARATOR => fields.push(std::mem::take(&mut current)),
            other => current.push(other),
        }
    }
    fields.push(current);

    Ok(fields)
}

/// Encode a boolean flag
pub fn encode_flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Encode an optional reference, writing the sentinel when absent
pub fn encode_ref(value: Option<&str>) -> &str {
    value.unwrap_or(NULL_REF)
}

/// Encode a float with the shortest representation that round-trips
pub fn encode_f64(value: f64) -> String {
    value.to_string()
}

/// Sequential reader over a record's fields
pub struct FieldReader {
    fields: std::vec::IntoIter<String>,
}

impl FieldReader {
    /// Split `line` and check the field count lies within `min..=max`
    pub fn new(line: &str, min: usize, max: Option<usize>) -> CodecResult<Self> {
        let fields = split_fields(line)?;
        let found = fields.len();
        let too_many = max.is_some_and(|max| found > max);
        if found < min || too_many {
            let expected = match max {
                Some(max) if max == min => min.to_string(),
                Some(max) => format!("{min}-{max}"),
                None => format!("at least {min}"),
            };
            return Err(CodecError::FieldCount { expected, found });
        }
        Ok(Self {
            fields: fields.into_iter(),
        })
    }

    /// Split `line` and require exactly `count` fields
    pub fn exact(line: &str, count: usize) -> CodecResult<Self> {
        Self::new(line, count, Some(count))
    }

    /// Number of fields not yet consumed
    pub fn remaining(&self) -> usize {
        self.fields.len()
    }

    /// Next field as a string
    ///
    /// Callers check the count up front, so a missing field decodes as empty.
    pub fn string(&mut self) -> String {
        self.fields.next().unwrap_or_default()
    }

    /// Next field as an optional reference
    pub fn reference(&mut self) -> Option<String> {
        let value = self.string();
        if value == NULL_REF || value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Next field as a finite float
    pub fn f64(&mut self, field: &'static str) -> CodecResult<f64> {
        parse_f64(field, &self.string())
    }

    /// Next field as an integer
    pub fn int<T: FromStr>(&mut self, field: &'static str) -> CodecResult<T> {
        parse_int(field, &self.string())
    }

    /// Next field as a `0`/`1` flag
    pub fn flag(&mut self, field: &'static str) -> CodecResult<bool> {
        parse_flag(field, &self.string())
    }

    /// Next field as epoch seconds
    pub fn timestamp(&mut self, field: &'static str) -> CodecResult<DateTime<Utc>> {
        let value = self.string();
        let secs: i64 = parse_int(field, &value)?;
        timestamp_from_epoch(secs).ok_or(CodecError::InvalidTimestamp { field, value })
    }

    /// Next field as a numeric enum code
    pub fn code<T>(&mut self, field: &'static str, lookup: impl FnOnce(u8) -> Option<T>) -> CodecResult<T> {
        let value = self.string();
        let code: u8 = parse_int(field, &value)?;
        lookup(code).ok_or(CodecError::InvalidEnum { field, value })
    }

    /// All fields not yet consumed
    pub fn rest(self) -> Vec<String> {
        self.fields.collect()
    }
}

/// Parse a finite float; `NaN` and infinities are rejected
pub fn parse_f64(field: &'static str, value: &str) -> CodecResult<f64> {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => Ok(number),
        _ => Err(CodecError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}

pub fn parse_int<T: FromStr>(field: &'static str, value: &str) -> CodecResult<T> {
    value.trim().parse::<T>().map_err(|_| CodecError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

pub fn parse_flag(field: &'static str, value: &str) -> CodecResult<bool> {
    match value.trim() {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(CodecError::InvalidFlag {
            field,
            value: value.to_string(),
        }),
    }
}
