//! CAROOT resolution.

use std::path::PathBuf;

use directories::BaseDirs;

/// Resolve the CA storage directory.
///
/// The `CAROOT` environment variable wins when set and non-empty, which
/// also allows maintaining multiple local CAs in parallel. Otherwise the
/// platform per-user data directory is used.
///
/// Returns `None` when no location can be determined; callers must fail
/// fast before any write.
pub fn caroot() -> Option<PathBuf> {
    if let Some(env) = std::env::var_os("CAROOT") {
        if !env.is_empty() {
            return Some(PathBuf::from(env));
        }
    }
    BaseDirs::new().map(|dirs| dirs.data_local_dir().join("certmint"))
}
