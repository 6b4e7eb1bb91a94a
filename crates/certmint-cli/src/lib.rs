//! # certmint-cli
//!
//! Command-line front end for certmint. The front end owns argument
//! parsing, the config file and presentation; all certificate and
//! trust-store behavior lives in the `certmint` crate.

pub mod cli;
pub mod config;

pub use cli::run;
