//! # certmint-trust
//!
//! Trust-store backends for the certmint local CA.
//!
//! Three stores are covered, each behind the same [`TrustStore`] capability
//! set:
//!
//! - **system** -- the operating system root store (Linux anchor
//!   directories or the macOS system keychain)
//! - **nss** -- browser-embedded NSS certificate databases (Firefox,
//!   Chromium), driven through `certutil`
//! - **java** -- the JVM-wide `cacerts` keystore, driven through `keytool`
//!
//! Backends are selected by runtime probing, so a single binary degrades to
//! "not applicable" on hosts where a store does not exist. Commands that
//! mutate root-owned state go through the [`PrivilegeGate`].

mod error;
mod gate;
mod java;
mod nss;
mod store;
mod system;

pub use error::{Result, TrustError};
pub use gate::PrivilegeGate;
pub use java::JavaStore;
pub use nss::NssStore;
pub use store::{binary_in_path, Availability, CaCert, TrustStore};
pub use system::SystemStore;
