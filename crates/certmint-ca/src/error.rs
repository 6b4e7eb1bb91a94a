use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for CA operations
pub type Result<T> = std::result::Result<T, CaError>;

/// Errors that can occur while managing the CA or issuing certificates
#[derive(Error, Debug)]
pub enum CaError {
    /// Input could not be classified as any supported subject kind
    #[error("{input:?} is not a valid hostname, IP, URL or email")]
    InvalidSubject {
        /// The raw argument as given by the caller
        input: String,
    },

    /// One half of the root pair exists without the other
    #[error("{present} exists but {missing} is missing under the CAROOT; move the remaining file away to generate a fresh CA")]
    InconsistentState {
        /// File that was found
        present: &'static str,
        /// File that was not
        missing: &'static str,
    },

    /// Key pair generation failed
    #[error("failed to generate key pair: {0}")]
    KeyGeneration(String),

    /// Certificate construction or signing failed
    #[error("failed to build certificate: {0}")]
    CertificateGeneration(String),

    /// Stored CA material could not be parsed
    #[error("failed to parse {what}: {reason}")]
    Parse {
        /// What was being parsed
        what: &'static str,
        /// Parser detail
        reason: String,
    },

    /// The supplied CSR is malformed or its signature does not verify
    #[error("invalid CSR: {0}")]
    Csr(String),

    /// Issuance was requested with an empty subject list
    #[error("no subjects to issue a certificate for")]
    NoSubjects,

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

impl CaError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }
}
