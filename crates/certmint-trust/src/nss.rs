//! NSS (Firefox/Chromium) trust store backend.
//!
//! NSS keeps per-profile certificate databases. The backend enumerates the
//! known profile locations at probe time and drives `certutil` against each
//! one, keyed by the CA nickname. A missing `certutil` is a degradation,
//! not a failure.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Result, TrustError};
use crate::gate::PrivilegeGate;
use crate::store::{binary_in_path, run, try_run, Availability, CaCert, TrustStore};

/// One NSS certificate database, addressed the way certutil wants it.
#[derive(Debug, Clone)]
struct NssProfile {
    db_spec: String,
}

/// Browser-embedded NSS certificate databases.
pub struct NssStore {
    profiles: Vec<NssProfile>,
    has_browser: bool,
}

impl NssStore {
    /// Probe the host for NSS profiles and browsers.
    pub fn probe() -> Self {
        let profiles = discover_profiles();
        let has_browser = binary_in_path("firefox") || binary_in_path("chromium");
        debug!(profiles = profiles.len(), has_browser, "probed NSS");
        Self {
            profiles,
            has_browser,
        }
    }

    fn certutil(&self) -> Result<()> {
        if binary_in_path("certutil") {
            Ok(())
        } else {
            Err(TrustError::MissingTool {
                tool: "certutil",
                hint: certutil_install_hint(),
            })
        }
    }
}

impl TrustStore for NssStore {
    fn name(&self) -> &'static str {
        "nss"
    }

    fn description(&self) -> String {
        String::from("the Firefox/NSS trust store")
    }

    fn availability(&self) -> Availability {
        if self.profiles.is_empty() && !self.has_browser {
            Availability::NotApplicable(String::from(
                "no NSS certificate databases or browsers were found",
            ))
        } else {
            Availability::Available
        }
    }

    /// Trusted only when every discovered profile validates the CA by
    /// nickname and at least one profile exists.
    fn is_installed(&self, ca: &CaCert) -> Result<bool> {
        if !binary_in_path("certutil") || self.profiles.is_empty() {
            return Ok(false);
        }
        let mut validated = 0usize;
        for profile in &self.profiles {
            let mut cmd = Command::new("certutil");
            cmd.args(["-V", "-d", &profile.db_spec, "-u", "L", "-n", &ca.nickname]);
            let (ok, _) = try_run(cmd)?;
            if !ok {
                return Ok(false);
            }
            validated += 1;
        }
        Ok(validated > 0)
    }

    fn install(&self, ca: &CaCert, _gate: &mut PrivilegeGate) -> Result<()> {
        self.certutil()?;
        let pem_path = ca.pem_path.to_string_lossy();
        for profile in &self.profiles {
            let mut cmd = Command::new("certutil");
            cmd.args([
                "-A",
                "-d",
                &profile.db_spec,
                "-t",
                "C,,",
                "-n",
                &ca.nickname,
                "-i",
                &pem_path,
            ]);
            run(cmd)?;
            debug!(profile = %profile.db_spec, "installed CA into NSS profile");
        }
        Ok(())
    }

    fn uninstall(&self, ca: &CaCert, _gate: &mut PrivilegeGate) -> Result<()> {
        self.certutil()?;
        for profile in &self.profiles {
            // Only detach where the nickname is actually present
            let mut check = Command::new("certutil");
            check.args(["-V", "-d", &profile.db_spec, "-u", "L", "-n", &ca.nickname]);
            let (present, _) = try_run(check)?;
            if !present {
                continue;
            }
            let mut cmd = Command::new("certutil");
            cmd.args(["-D", "-d", &profile.db_spec, "-n", &ca.nickname]);
            run(cmd)?;
            debug!(profile = %profile.db_spec, "removed CA from NSS profile");
        }
        Ok(())
    }
}

/// Enumerate NSS databases across the known profile locations.
fn discover_profiles() -> Vec<NssProfile> {
    let mut candidates: Vec<PathBuf> = vec![PathBuf::from("/etc/pki/nssdb")];
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        candidates.push(home.join(".pki/nssdb"));
        candidates.push(home.join("snap/chromium/current/.pki/nssdb"));
        candidates.extend(children(&home.join(".mozilla/firefox")));
        candidates.extend(children(&home.join("snap/firefox/common/.mozilla/firefox")));
        candidates.extend(children(
            &home.join("Library/Application Support/Firefox/Profiles"),
        ));
    }

    let mut profiles = Vec::new();
    for dir in candidates {
        if let Some(profile) = profile_for(&dir) {
            profiles.push(profile);
        }
    }
    profiles
}

fn children(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect()
}

/// A directory is a profile when it holds an NSS database; cert9 databases
/// are addressed as `sql:`, legacy cert8 ones as `dbm:`.
fn profile_for(dir: &Path) -> Option<NssProfile> {
    if dir.join("cert9.db").exists() {
        return Some(NssProfile {
            db_spec: format!("sql:{}", dir.display()),
        });
    }
    if dir.join("cert8.db").exists() {
        return Some(NssProfile {
            db_spec: format!("dbm:{}", dir.display()),
        });
    }
    None
}

/// Suggest the package that provides certutil for the local package
/// manager.
fn certutil_install_hint() -> Option<String> {
    if binary_in_path("apt") || binary_in_path("apt-get") {
        Some(String::from("apt install libnss3-tools"))
    } else if binary_in_path("dnf") {
        Some(String::from("dnf install nss-tools"))
    } else if binary_in_path("yum") {
        Some(String::from("yum install nss-tools"))
    } else if binary_in_path("zypper") {
        Some(String::from("zypper install mozilla-nss-tools"))
    } else if binary_in_path("brew") {
        Some(String::from("brew install nss"))
    } else {
        None
    }
}
