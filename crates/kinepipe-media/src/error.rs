//! Error type for external-tool invocations

use std::io;

/// Error from one external-tool step of a transform.
///
/// Carries enough of the tool's own output for the worker's rate-limit
/// signature check and for a useful failure-log row.
#[derive(Debug)]
pub enum MediaError {
    /// Required binary not found on PATH.
    MissingTool(&'static str),
    /// Tool ran and exited non-zero; `output` holds the tail of its
    /// combined stdout/stderr.
    Tool { tool: &'static str, output: String },
    /// Tool produced output we could not interpret.
    Parse { tool: &'static str, message: String },
    Io(io::Error),
}

impl std::fmt::Display for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingTool(tool) => write!(f, "{tool} not found on PATH"),
            Self::Tool { tool, output } => write!(f, "{tool} failed: {output}"),
            Self::Parse { tool, message } => write!(f, "unexpected {tool} output: {message}"),
            Self::Io(e) => write!(f, "IO: {e}"),
        }
    }
}

impl std::error::Error for MediaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MediaError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}
