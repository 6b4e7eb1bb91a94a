use std::path::PathBuf;
use thiserror::Error;

use certmint_ca::CaError;
use certmint_trust::TrustError;

/// Result type alias for certmint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the front end
#[derive(Error, Debug)]
pub enum Error {
    /// Install and Uninstall are mutually exclusive
    #[error("you can't set --install and --uninstall at the same time")]
    InstallAndUninstall,

    /// The CAROOT query mode cannot run alongside install or uninstall
    #[error("you can't combine --caroot with --install or --uninstall")]
    CarootWithMode,

    /// CSR issuance excludes algorithm, usage and bundle flags
    #[error("--csr can only be combined with --install and --cert-file")]
    CsrWithIssuanceFlags,

    /// CSR issuance excludes positional subjects
    #[error("you can't specify subjects when using --csr")]
    CsrWithSubjects,

    /// Nothing to do: no mode flag and nothing to issue for
    #[error("pass at least one hostname, IP, URL or email to issue a certificate for")]
    NoSubjects,

    /// No CAROOT could be resolved
    #[error("failed to find the default CA location, set one as the CAROOT env var")]
    CarootUnresolved,

    /// The CAROOT directory could not be created
    #[error("failed to create the CAROOT at {path}: {source}")]
    CarootCreate {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The CSR file could not be read
    #[error("failed to read the CSR at {path}: {source}")]
    CsrRead {
        /// Path given with --csr
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// CA or issuance error
    #[error(transparent)]
    Ca(#[from] CaError),

    /// Trust-store error
    #[error(transparent)]
    Trust(#[from] TrustError),
}
