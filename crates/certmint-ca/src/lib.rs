//! # certmint-ca
//!
//! Local certificate authority for development certificates.
//!
//! ## Layout
//!
//! ```text
//! CAROOT/
//!   rootCA.pem       self-signed root certificate (CA=true)
//!   rootCA-key.pem   root private key, owner-readable only
//! ```
//!
//! The root pair is materialized once per CAROOT and loaded on every
//! subsequent run. Leaf certificates are signed under it, either from a
//! list of classified subjects or from an externally supplied CSR.
//!
//! ## Example
//!
//! ```rust,ignore
//! use certmint_ca::{classify_all, issue, CaAuthority, IssueRequest, SubjectRequest};
//!
//! let ca = CaAuthority::load_or_create(caroot)?;
//! let subjects = classify_all(&["example.org".into()])?;
//! let bundle = issue(&ca, &IssueRequest::Subjects(SubjectRequest {
//!     subjects,
//!     ..SubjectRequest::default()
//! }))?;
//! ```

mod authority;
mod error;
mod issuer;
mod subject;

pub use authority::{CaAuthority, ROOT_CERT_FILE, ROOT_KEY_FILE};
pub use error::{CaError, Result};
pub use issuer::{
    default_stem, issue, CsrRequest, IssueRequest, IssuedBundle, OutputPaths, SubjectRequest,
    P12_PASSWORD,
};
pub use subject::{classify_all, wildcard_advisories, Subject};

/// Key algorithm choices for leaf certificates.
///
/// The root CA key algorithm is fixed and not affected by this choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyAlgorithm {
    /// RSA 2048-bit (default, maximum client compatibility)
    #[default]
    Rsa2048,
    /// ECDSA with the P-256 curve
    EcdsaP256,
}
