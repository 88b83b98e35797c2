//! Error taxonomy for the dBFT node.
//!
//! The taxonomy is split the way the rest of this family of crates splits it:
//! a small, stable [`ErrorKind`] that callers can match on, wrapping an
//! open-ended reason that is free to grow without becoming a breaking change.

mod internal;

pub use internal::{InternalError, InternalErrorKind};

use std::fmt;
use thiserror::Error;

/// A list specifying the categories of error the node can surface.
///
/// This list is intentionally small and stable; the reason carried inside
/// each variant is where the real detail lives. Do not exhaustively match
/// against it outside of logging/metrics code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Decoding/parsing failure: `IRREGULAR_DATA`, `UNEXPECTED_EOF`, `INVALID_FIELD`.
    Shape,
    /// Admission denied by pool policy: pool-full, duplicate, sender-quota.
    Policy,
    /// A stateless or stateful validator rejected a transaction.
    Validator,
    /// A consensus-invariant violation was detected locally (e.g. equivocation).
    Protocol,
    /// A recoverable condition: timeout, queue overflow, snapshot unavailable.
    Transient,
    /// An unrecoverable condition: ledger corruption, crypto primitive failure.
    Fatal,
    /// Everything that does not fit the categories above.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Shape => "Shape",
            ErrorKind::Policy => "Policy",
            ErrorKind::Validator => "Validator",
            ErrorKind::Protocol => "Protocol",
            ErrorKind::Transient => "Transient",
            ErrorKind::Fatal => "Fatal",
            ErrorKind::Internal => "Internal",
        };
        f.write_str(name)
    }
}

/// The node-wide error type.
///
/// Carries a stable [`ErrorKind`] plus a human-readable reason. Use
/// [`Error::kind`] to dispatch recovery behavior; use the `Display`
/// implementation only for logs.
#[derive(Error, Debug)]
#[error("{kind}: {reason}")]
pub struct Error {
    kind: ErrorKind,
    reason: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl Error {
    /// Builds an error of the given kind with a plain-text reason.
    pub fn new<T: fmt::Display>(kind: ErrorKind, reason: T) -> Self {
        Error {
            kind,
            reason: reason.to_string(),
            source: None,
        }
    }

    /// Builds an error of the given kind, chaining an underlying cause.
    pub fn with_source<T: fmt::Display>(
        kind: ErrorKind,
        reason: T,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error {
            kind,
            reason: reason.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// The stable category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// `true` if this error is recoverable by retrying the originating
    /// operation a bounded number of times (see `TransientError` in the
    /// error handling design).
    pub fn is_transient(&self) -> bool {
        self.kind == ErrorKind::Transient
    }

    /// `true` if this error must propagate to the top-level supervisor and
    /// trigger graceful shutdown.
    pub fn is_fatal(&self) -> bool {
        self.kind == ErrorKind::Fatal
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        Error::with_source(ErrorKind::Internal, err.to_string(), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_kind_and_reason() {
        let err = Error::new(ErrorKind::Policy, "pool is full");
        assert_eq!(err.to_string(), "Policy: pool is full");
        assert_eq!(err.kind(), ErrorKind::Policy);
    }

    #[test]
    fn transient_and_fatal_predicates() {
        assert!(Error::new(ErrorKind::Transient, "timeout").is_transient());
        assert!(Error::new(ErrorKind::Fatal, "ledger corrupted").is_fatal());
        assert!(!Error::new(ErrorKind::Shape, "bad varuint").is_fatal());
    }
}
