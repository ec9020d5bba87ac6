//! Error types for relayforge-av.

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or running external tools.
///
/// A tool that runs and exits non-zero is not an error at this level; the
/// caller inspects [`ToolOutput`](crate::ToolOutput) and decides.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool could not be run at all.
    #[error("tool execution failed: {tool}: {message}")]
    ToolFailed { tool: String, message: String },

    /// A conversion spec token was rejected.
    #[error("invalid conversion spec token {token:?}: {reason}")]
    InvalidConversionSpec { token: String, reason: String },

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution failed error.
    pub fn tool_failed(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create an invalid conversion spec error.
    pub fn invalid_spec(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConversionSpec {
            token: token.into(),
            reason: reason.into(),
        }
    }
}
