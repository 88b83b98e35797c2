use std::fmt;
use thiserror::Error;

/// Categories of internal/system error, growable over time.
///
/// It is used with [`InternalError`] and is not recommended to be
/// exhaustively matched against.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InternalErrorKind {
    /// Arithmetic overflow, e.g. while summing byte caps.
    Overflow,
    /// Persisted data was corrupted.
    DataCorrupted,
    /// The configuration is missing a required value or is self-contradictory.
    Config,
    /// Underlying I/O failure.
    Io,
    /// Anything that does not fit the categories above.
    Other,
}

impl fmt::Display for InternalErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InternalErrorKind::Overflow => "Overflow",
            InternalErrorKind::DataCorrupted => "DataCorrupted",
            InternalErrorKind::Config => "Config",
            InternalErrorKind::Io => "Io",
            InternalErrorKind::Other => "Other",
        };
        f.write_str(name)
    }
}

/// An internal error: a kind plus a free-form reason.
#[derive(Error, Debug, Clone)]
#[error("{kind}: {reason}")]
pub struct InternalError {
    kind: InternalErrorKind,
    reason: String,
}

impl InternalError {
    /// Creates an internal error with only a string as the reason.
    pub fn new<T: fmt::Display>(kind: InternalErrorKind, reason: T) -> Self {
        InternalError {
            kind,
            reason: reason.to_string(),
        }
    }

    /// The category of this internal error.
    pub fn kind(&self) -> InternalErrorKind {
        self.kind
    }
}
