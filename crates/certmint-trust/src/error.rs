use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for trust-store operations
pub type Result<T> = std::result::Result<T, TrustError>;

/// Errors that can occur while driving a trust-store backend
#[derive(Error, Debug)]
pub enum TrustError {
    /// Helper tool required by a backend is not installed.
    /// Non-fatal: the orchestrator degrades this to a warning.
    #[error("{tool:?} is not available")]
    MissingTool {
        /// Executable name
        tool: &'static str,
        /// How to install it, when a package manager was recognized
        hint: Option<String>,
    },

    /// Backend does not apply on this host
    #[error("not applicable: {0}")]
    NotApplicable(String),

    /// Helper command failed to spawn or exited non-zero.
    /// Fatal for this backend only; the captured output is preserved for
    /// the log.
    #[error("failed to execute \"{command}\": {detail}\n\n{output}")]
    Command {
        /// Rendered command line
        command: String,
        /// Spawn error or exit status
        detail: String,
        /// Combined stdout and stderr
        output: String,
    },

    /// File I/O error
    #[error("failed to {action} {path}: {source}")]
    Io {
        /// Operation that failed
        action: &'static str,
        /// Path involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
}
