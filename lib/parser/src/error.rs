use crate::grammar::HeaderError;
use std::io;

/// An error that occurred while parsing a benchmark log.
///
/// Only [ParseError::Io] indicates a problem with the environment. All other variants reject a
/// single log file and can be skipped by the caller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The log could not be read.
    #[error("cannot read '{origin}'")]
    Io {
        origin: String,
        #[source]
        error: io::Error,
    },
    /// The log ends before the benchmark header.
    #[error("'{origin}' ends before the benchmark header")]
    MissingHeader { origin: String },
    /// The second line of the log does not follow the header grammar.
    #[error("'{origin}' has an unrecognized benchmark header: {line:?}")]
    UnrecognizedHeader { origin: String, line: String },
    /// The header matched, but one of its counts is not usable.
    #[error("'{origin}' announces an invalid {field} count: {value}")]
    InvalidCount {
        origin: String,
        field: &'static str,
        value: String,
    },
}

impl ParseError {
    /// Returns true if the error should abort the whole batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ParseError::Io { .. })
    }

    pub(crate) fn from_header(origin: &str, line: &str, error: HeaderError) -> Self {
        let origin = origin.to_owned();
        match error {
            HeaderError::NoMatch => ParseError::UnrecognizedHeader {
                origin,
                line: line.to_owned(),
            },
            HeaderError::InvalidCount { field, value } => {
                ParseError::InvalidCount {
                    origin,
                    field,
                    value,
                }
            }
        }
    }
}
