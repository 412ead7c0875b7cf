//! Pool lifecycle error type

use std::io;

/// Error starting or stopping a pool.
///
/// Per-item failures never surface here — they are converted to
/// [`FailureRecord`](crate::records::FailureRecord)s inside the worker
/// loop. This type covers infrastructure only: spawning threads, reading
/// the failure log at startup, and sink I/O at shutdown.
#[derive(Debug)]
pub enum PoolError {
    /// Failure log could not be parsed at startup.
    FailureLog(csv::Error),
    Io(io::Error),
}

impl std::fmt::Display for PoolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FailureLog(e) => write!(f, "failure log: {e}"),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for PoolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::FailureLog(e) => Some(e),
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for PoolError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<csv::Error> for PoolError {
    fn from(e: csv::Error) -> Self {
        Self::FailureLog(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_io() {
        let err = PoolError::from(io::Error::new(io::ErrorKind::NotFound, "missing"));
        assert!(format!("{err}").contains("IO:"));
    }

    #[test]
    fn source_is_preserved() {
        let err = PoolError::from(io::Error::other("inner"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
