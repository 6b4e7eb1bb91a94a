//! System trust store backend.
//!
//! The concrete flavor is probed at startup: one of the known Linux anchor
//! directory / update command pairs, or the macOS system keychain. Hosts
//! with neither report not-applicable instead of failing.
//!
//! The trust check scans the platform CA bundles for the root's SHA-256
//! fingerprint rather than asking a verification API; a root that shows up
//! in the extracted bundles is what every TLS client on the machine will
//! see.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::gate::PrivilegeGate;
use crate::store::{binary_in_path, run, run_with_stdin, Availability, CaCert, TrustStore};

struct LinuxFlavor {
    anchor_dir: &'static str,
    anchor_ext: &'static str,
    update_command: &'static [&'static str],
}

/// Anchor conventions across Linux families, probed in order.
const LINUX_FLAVORS: &[LinuxFlavor] = &[
    // Fedora / RHEL
    LinuxFlavor {
        anchor_dir: "/etc/pki/ca-trust/source/anchors",
        anchor_ext: "pem",
        update_command: &["update-ca-trust", "extract"],
    },
    // Debian / Ubuntu
    LinuxFlavor {
        anchor_dir: "/usr/local/share/ca-certificates",
        anchor_ext: "crt",
        update_command: &["update-ca-certificates"],
    },
    // Arch (p11-kit)
    LinuxFlavor {
        anchor_dir: "/etc/ca-certificates/trust-source/anchors",
        anchor_ext: "crt",
        update_command: &["trust", "extract-compat"],
    },
    // SUSE
    LinuxFlavor {
        anchor_dir: "/usr/share/pki/trust/anchors",
        anchor_ext: "pem",
        update_command: &["update-ca-certificates"],
    },
];

/// CA bundle locations scanned by the trust check.
const CA_BUNDLE_PATHS: &[&str] = &[
    "/etc/ssl/certs/ca-certificates.crt",
    "/etc/ssl/certs/ca-bundle.crt",
    "/etc/ssl/certs",
    "/etc/pki/tls/certs",
    "/etc/ssl/ca-bundle.pem",
    "/etc/ssl/cert.pem",
    "/etc/ca-certificates/extracted/tls-ca-bundle.pem",
];

const DARWIN_KEYCHAIN: &str = "/Library/Keychains/System.keychain";

enum Flavor {
    Linux(&'static LinuxFlavor),
    Darwin,
}

/// The OS-wide root store.
pub struct SystemStore {
    flavor: Option<Flavor>,
}

impl SystemStore {
    /// Probe the host for a supported system store.
    pub fn probe() -> Self {
        for flavor in LINUX_FLAVORS {
            if Path::new(flavor.anchor_dir).is_dir() {
                debug!(anchor_dir = flavor.anchor_dir, "using Linux system store");
                return Self {
                    flavor: Some(Flavor::Linux(flavor)),
                };
            }
        }
        if Path::new(DARWIN_KEYCHAIN).exists() && binary_in_path("security") {
            debug!("using macOS system keychain");
            return Self {
                flavor: Some(Flavor::Darwin),
            };
        }
        Self { flavor: None }
    }

    fn anchor_path(&self, ca: &CaCert) -> Option<PathBuf> {
        match &self.flavor {
            Some(Flavor::Linux(flavor)) => Some(
                Path::new(flavor.anchor_dir)
                    .join(format!("{}.{}", anchor_file_stem(&ca.nickname), flavor.anchor_ext)),
            ),
            _ => None,
        }
    }
}

impl TrustStore for SystemStore {
    fn name(&self) -> &'static str {
        "system"
    }

    fn description(&self) -> String {
        String::from("the system trust store")
    }

    fn availability(&self) -> Availability {
        if self.flavor.is_some() {
            Availability::Available
        } else {
            Availability::NotApplicable(String::from(
                "installing to the system trust store is not supported on this platform",
            ))
        }
    }

    fn is_installed(&self, ca: &CaCert) -> Result<bool> {
        match &self.flavor {
            Some(Flavor::Linux(_)) => {
                let fingerprint = ca.fingerprint_hex();
                let mut paths: Vec<PathBuf> =
                    CA_BUNDLE_PATHS.iter().map(PathBuf::from).collect();
                if let Some(anchor) = self.anchor_path(ca) {
                    paths.push(anchor);
                }
                Ok(paths.iter().any(|path| location_contains(path, &fingerprint)))
            }
            Some(Flavor::Darwin) => {
                let mut cmd = std::process::Command::new("security");
                cmd.args(["find-certificate", "-a", "-Z", DARWIN_KEYCHAIN]);
                let (_, output) = crate::store::try_run(cmd)?;
                Ok(output.contains(&ca.fingerprint_sha1_hex()))
            }
            None => Ok(false),
        }
    }

    fn install(&self, ca: &CaCert, gate: &mut PrivilegeGate) -> Result<()> {
        match &self.flavor {
            Some(Flavor::Linux(flavor)) => {
                let anchor = self
                    .anchor_path(ca)
                    .unwrap_or_else(|| PathBuf::from(flavor.anchor_dir));
                let anchor_str = anchor.to_string_lossy();
                // Write through tee so one escalation covers the root-owned
                // target
                let tee = gate.command("tee", &[&anchor_str]);
                run_with_stdin(tee, ca.pem.as_bytes())?;
                run(gate.command(flavor.update_command[0], &flavor.update_command[1..]))?;
                Ok(())
            }
            Some(Flavor::Darwin) => {
                let pem_path = ca.pem_path.to_string_lossy();
                run(gate.command(
                    "security",
                    &["add-trusted-cert", "-d", "-k", DARWIN_KEYCHAIN, &pem_path],
                ))?;
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn uninstall(&self, ca: &CaCert, gate: &mut PrivilegeGate) -> Result<()> {
        match &self.flavor {
            Some(Flavor::Linux(flavor)) => {
                if let Some(anchor) = self.anchor_path(ca) {
                    let anchor_str = anchor.to_string_lossy();
                    run(gate.command("rm", &["-f", &anchor_str]))?;
                }
                run(gate.command(flavor.update_command[0], &flavor.update_command[1..]))?;
                Ok(())
            }
            Some(Flavor::Darwin) => {
                let sha1 = ca.fingerprint_sha1_hex();
                run(gate.command(
                    "security",
                    &["delete-certificate", "-Z", &sha1, DARWIN_KEYCHAIN],
                ))?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

/// Flatten the CA nickname into a filesystem-safe anchor file stem.
fn anchor_file_stem(nickname: &str) -> String {
    nickname
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Whether a bundle file or certificate directory contains a certificate
/// with the given SHA-256 fingerprint. Unreadable entries are skipped.
fn location_contains(path: &Path, fingerprint: &str) -> bool {
    if path.is_file() {
        return bundle_contains(path, fingerprint);
    }
    if path.is_dir() {
        let Ok(entries) = fs::read_dir(path) else {
            return false;
        };
        for entry in entries.flatten() {
            let entry_path = entry.path();
            let ext = entry_path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("");
            if !matches!(ext, "pem" | "crt" | "cer") {
                continue;
            }
            if entry_path.is_file() && bundle_contains(&entry_path, fingerprint) {
                return true;
            }
        }
    }
    false
}

fn bundle_contains(path: &Path, fingerprint: &str) -> bool {
    let Ok(content) = fs::read(path) else {
        return false;
    };
    let blocks = match pem::parse_many(&content) {
        Ok(blocks) => blocks,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse CA bundle");
            return false;
        }
    };
    blocks.iter().any(|block| {
        block.tag() == "CERTIFICATE" && sha256_hex(block.contents()) == fingerprint
    })
}

fn sha256_hex(data: &[u8]) -> String {
    let digest = ring::digest::digest(&ring::digest::SHA256, data);
    hex::encode(digest.as_ref())
}
