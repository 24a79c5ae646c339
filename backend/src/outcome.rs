//! Result of an operation whose failure may or may not concern the caller.

use std::fmt;

pub enum Outcome<T> {
    /// The operation completed.
    Success(T),
    /// The operation failed; the caller carries on after logging it.
    Tolerated(anyhow::Error),
    /// The operation failed and the caller must stop.
    Fatal(anyhow::Error),
}

impl<T> Outcome<T> {
    /// Treat any error from `result` as non-fatal.
    pub fn tolerate(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::Tolerated(e),
        }
    }

    /// Treat any error from `result` as fatal.
    pub fn require(result: anyhow::Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::Fatal(e),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, Outcome::Fatal(_))
    }

    pub fn error(&self) -> Option<&anyhow::Error> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Tolerated(e) | Outcome::Fatal(e) => Some(e),
        }
    }

    /// Downgrade a fatal failure to a tolerated one.
    pub fn tolerated(self) -> Self {
        match self {
            Outcome::Fatal(e) => Outcome::Tolerated(e),
            other => other,
        }
    }

    pub fn into_result(self) -> anyhow::Result<T> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Tolerated(e) | Outcome::Fatal(e) => Err(e),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Outcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(value) => f.debug_tuple("Success").field(value).finish(),
            Outcome::Tolerated(e) => write!(f, "Tolerated({:#})", e),
            Outcome::Fatal(e) => write!(f, "Fatal({:#})", e),
        }
    }
}
