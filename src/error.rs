//! Error handling for the whole crate.
//!
//! Every fallible operation returns [`Error`]. Its variants correspond to the
//! failure categories callers act on: bad setup, bad input data, bad wire
//! payloads, backend failures, and expired deadlines. [`ErrorKind`] is the
//! payload-free tag used on the HTTP surface.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Crate error type
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid parameters or an inconsistent setup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Malformed reference data or embeddings.
    #[error("data format error: {0}")]
    DataFormat(String),

    /// Undecodable or mismatched wire payloads.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A homomorphic operation failed.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Evaluation was cancelled or ran past its deadline.
    #[error("evaluation cancelled after {0:?}")]
    DeadlineExceeded(Duration),
}

/// Failure category of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    DataFormat,
    Protocol,
    Evaluation,
    DeadlineExceeded,
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::DataFormat(_) => ErrorKind::DataFormat,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::Evaluation(_) => ErrorKind::Evaluation,
            Error::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::DataFormat => "data_format",
            ErrorKind::Protocol => "protocol",
            ErrorKind::Evaluation => "evaluation",
            ErrorKind::DeadlineExceeded => "deadline_exceeded",
        };
        f.write_str(name)
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Protocol(err.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::DataFormat(err.to_string())
    }
}

/// Result type for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Create an [`Error`] of the given variant with format string support
macro_rules! err {
    ($kind:ident, $($arg:tt)*) => {
        $crate::error::Error::$kind(format!($($arg)*))
    };
}

pub(crate) use err;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_matches_variant() {
        assert_eq!(
            err!(Protocol, "bad {}", "payload").kind(),
            ErrorKind::Protocol
        );
        assert_eq!(
            Error::DeadlineExceeded(Duration::from_millis(5)).kind(),
            ErrorKind::DeadlineExceeded
        );
    }

    #[test]
    fn test_bincode_errors_are_protocol_errors() {
        let decoded: std::result::Result<Vec<u64>, _> = bincode::deserialize(&[1, 2, 3]);
        let err: Error = decoded.unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_display_includes_message() {
        let err = err!(DataFormat, "row {} has {} columns", 3, 7);
        assert_eq!(err.to_string(), "data format error: row 3 has 7 columns");
        assert_eq!(ErrorKind::DataFormat.to_string(), "data_format");
    }
}
