//! Trust-store backend abstraction and subprocess helpers.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use crate::error::{Result, TrustError};
use crate::gate::PrivilegeGate;

/// Handle to the CA material a backend operates on.
#[derive(Debug, Clone)]
pub struct CaCert {
    /// Path of the PEM root certificate on disk
    pub pem_path: PathBuf,
    /// PEM text of the root certificate
    pub pem: String,
    /// DER bytes of the root certificate
    pub der: Vec<u8>,
    /// Nickname identifying this CA in NSS databases and Java keystores
    pub nickname: String,
}

impl CaCert {
    /// Lowercase hex SHA-256 of the certificate DER.
    pub fn fingerprint_hex(&self) -> String {
        let digest = ring::digest::digest(&ring::digest::SHA256, &self.der);
        hex::encode(digest.as_ref())
    }

    /// Colon-separated uppercase SHA-256, the form keytool prints.
    pub fn fingerprint_colon_hex(&self) -> String {
        let hex = self.fingerprint_hex().to_uppercase();
        hex.as_bytes()
            .chunks(2)
            .map(|pair| std::str::from_utf8(pair).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Uppercase hex SHA-1, used by the macOS keychain for deletion.
    pub fn fingerprint_sha1_hex(&self) -> String {
        let digest = ring::digest::digest(&ring::digest::SHA1_FOR_LEGACY_USE_ONLY, &self.der);
        hex::encode_upper(digest.as_ref())
    }
}

/// Whether a backend can operate on this host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// The store exists and can be consulted
    Available,
    /// The store does not apply here; carries the reason for the log
    NotApplicable(String),
}

/// Capability set shared by every trust-store backend.
///
/// Implementations must be safe to call when unavailable: probing returns
/// [`Availability::NotApplicable`] instead of erroring, so the orchestrator
/// treats all backends uniformly.
pub trait TrustStore {
    /// Enablement-set name: `system`, `nss` or `java`.
    fn name(&self) -> &'static str;

    /// Human-readable store description for log lines.
    fn description(&self) -> String;

    /// Runtime availability probe.
    fn availability(&self) -> Availability;

    /// Whether the CA is currently trusted by this store.
    fn is_installed(&self, ca: &CaCert) -> Result<bool>;

    /// Install the CA into this store.
    fn install(&self, ca: &CaCert, gate: &mut PrivilegeGate) -> Result<()>;

    /// Detach trust from this store. CA material on disk is untouched.
    fn uninstall(&self, ca: &CaCert, gate: &mut PrivilegeGate) -> Result<()>;
}

/// Look an executable up on `PATH`.
pub fn binary_in_path(name: &str) -> bool {
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(name).is_file())
}

/// Render a command line the way it would be typed, for error reporting.
pub(crate) fn render(cmd: &Command) -> String {
    std::iter::once(cmd.get_program())
        .chain(cmd.get_args())
        .map(|part| part.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run a helper command to completion, treating non-zero exit as an error
/// that carries the rendered command line and combined output.
pub(crate) fn run(mut cmd: Command) -> Result<String> {
    let command = render(&cmd);
    let output = cmd.output().map_err(|e| TrustError::Command {
        command: command.clone(),
        detail: e.to_string(),
        output: String::new(),
    })?;
    let combined = combine(&output.stdout, &output.stderr);
    if !output.status.success() {
        return Err(TrustError::Command {
            command,
            detail: format!("exited with {}", output.status),
            output: combined,
        });
    }
    Ok(combined)
}

/// Run a helper command whose non-zero exit is an answer, not a failure.
/// Returns the success flag and combined output; only spawn errors fail.
pub(crate) fn try_run(mut cmd: Command) -> Result<(bool, String)> {
    let command = render(&cmd);
    let output = cmd.output().map_err(|e| TrustError::Command {
        command,
        detail: e.to_string(),
        output: String::new(),
    })?;
    Ok((
        output.status.success(),
        combine(&output.stdout, &output.stderr),
    ))
}

/// Run a helper command feeding `input` to its stdin.
pub(crate) fn run_with_stdin(mut cmd: Command, input: &[u8]) -> Result<String> {
    let command = render(&cmd);
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| TrustError::Command {
        command: command.clone(),
        detail: e.to_string(),
        output: String::new(),
    })?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input).map_err(|e| TrustError::Command {
            command: command.clone(),
            detail: format!("failed to write stdin: {e}"),
            output: String::new(),
        })?;
    }
    let output = child.wait_with_output().map_err(|e| TrustError::Command {
        command: command.clone(),
        detail: e.to_string(),
        output: String::new(),
    })?;
    let combined = combine(&output.stdout, &output.stderr);
    if !output.status.success() {
        return Err(TrustError::Command {
            command,
            detail: format!("exited with {}", output.status),
            output: combined,
        });
    }
    Ok(combined)
}

fn combine(stdout: &[u8], stderr: &[u8]) -> String {
    let mut combined = String::from_utf8_lossy(stdout).into_owned();
    let err = String::from_utf8_lossy(stderr);
    if !err.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&err);
    }
    combined
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ca_fixture() -> CaCert {
        CaCert {
            pem_path: PathBuf::from("/tmp/rootCA.pem"),
            pem: String::new(),
            der: b"hello world".to_vec(),
            nickname: "certmint development CA 1".to_string(),
        }
    }

    #[test]
    fn test_fingerprint_hex() {
        assert_eq!(
            ca_fixture().fingerprint_hex(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_fingerprint_colon_hex() {
        let colon = ca_fixture().fingerprint_colon_hex();
        assert!(colon.starts_with("B9:4D:27:B9"));
        assert_eq!(colon.len(), 32 * 3 - 1);
    }

    #[test]
    fn test_run_captures_failure_output() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo broken >&2; exit 3"]);
        let err = run(cmd).unwrap_err();
        match err {
            TrustError::Command {
                command,
                detail,
                output,
            } => {
                assert!(command.starts_with("sh"));
                assert!(detail.contains("exit"));
                assert!(output.contains("broken"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_try_run_reports_exit_without_error() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exit 1"]);
        let (ok, _) = try_run(cmd).unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_run_with_stdin_round_trip() {
        let cmd = Command::new("cat");
        let out = run_with_stdin(cmd, b"pem bytes").unwrap();
        assert_eq!(out, "pem bytes");
    }

    #[test]
    fn test_binary_in_path() {
        assert!(binary_in_path("sh"));
        assert!(!binary_in_path("definitely-not-a-real-binary-name"));
    }
}
