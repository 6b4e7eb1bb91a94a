//! Locally-trusted development certificates with automatic trust-store
//! installation.
//!
//! certmint provisions a per-user certificate authority, issues leaf TLS
//! certificates for development use, and reconciles trust for the CA across
//! the operating-system store, browser NSS databases and the Java
//! keystore.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use certmint::{plan, run, Options};
//!
//! let options = Options {
//!     install: true,
//!     subjects: vec!["example.org".to_string()],
//!     ..Options::default()
//! };
//! run(&options)?;
//! ```
//!
//! The environment drives two knobs: `CAROOT` overrides where the CA pair
//! is stored, and `TRUST_STORES` restricts which backends are consulted
//! (a comma-separated subset of `system`, `nss`, `java`).

mod caroot;
mod error;
mod orchestrator;

pub use caroot::caroot;
pub use error::{Error, Result};
pub use orchestrator::{plan, Enablement, Operation, Options, Orchestrator};

// Re-export the domain crates
pub use certmint_ca as ca;
pub use certmint_trust as trust;

/// Plan and execute one invocation against the default CAROOT.
///
/// The CAROOT query short-circuits before any CA state is touched, so
/// querying the location never materializes a CA.
///
/// # Errors
///
/// Configuration errors are returned before any side effect; CA and
/// issuance errors abort the run.
pub fn run(options: &Options) -> Result<()> {
    let operations = plan(options)?;
    if operations.first() == Some(&Operation::CarootQuery) {
        let root = caroot().ok_or(Error::CarootUnresolved)?;
        println!("{}", root.display());
        return Ok(());
    }
    let mut orchestrator = Orchestrator::new(options)?;
    orchestrator.run(&operations, options)
}
