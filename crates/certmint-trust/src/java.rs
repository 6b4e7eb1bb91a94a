//! Java trust store backend.
//!
//! Applies when `JAVA_HOME` points at a runtime with a `cacerts` keystore.
//! All operations go through `keytool`, keyed by the CA nickname as the
//! alias; the keystore password is the JDK default.

use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use crate::error::{Result, TrustError};
use crate::gate::PrivilegeGate;
use crate::store::{try_run, Availability, CaCert, TrustStore};

const STORE_PASS: &str = "changeit";

/// The JVM-wide cacerts keystore.
pub struct JavaStore {
    java_home: Option<PathBuf>,
    cacerts: Option<PathBuf>,
    keytool: Option<PathBuf>,
}

impl JavaStore {
    /// Probe `JAVA_HOME` for a keystore and the keytool helper.
    pub fn probe() -> Self {
        let Some(java_home) = std::env::var_os("JAVA_HOME").map(PathBuf::from) else {
            return Self {
                java_home: None,
                cacerts: None,
                keytool: None,
            };
        };
        let cacerts = [
            java_home.join("lib/security/cacerts"),
            java_home.join("jre/lib/security/cacerts"),
        ]
        .into_iter()
        .find(|path| path.is_file());
        let keytool = Some(java_home.join("bin/keytool")).filter(|path| path.is_file());
        debug!(
            java_home = %java_home.display(),
            cacerts = cacerts.is_some(),
            keytool = keytool.is_some(),
            "probed Java runtime"
        );
        Self {
            java_home: Some(java_home),
            cacerts,
            keytool,
        }
    }

    fn keytool(&self) -> Result<&PathBuf> {
        self.keytool.as_ref().ok_or(TrustError::MissingTool {
            tool: "keytool",
            hint: None,
        })
    }
}

impl TrustStore for JavaStore {
    fn name(&self) -> &'static str {
        "java"
    }

    fn description(&self) -> String {
        String::from("Java's trust store")
    }

    fn availability(&self) -> Availability {
        if self.java_home.is_none() {
            return Availability::NotApplicable(String::from("$JAVA_HOME is not set"));
        }
        if self.cacerts.is_none() {
            return Availability::NotApplicable(String::from(
                "no cacerts keystore was found under $JAVA_HOME",
            ));
        }
        Availability::Available
    }

    fn is_installed(&self, ca: &CaCert) -> Result<bool> {
        let (Some(keytool), Some(cacerts)) = (&self.keytool, &self.cacerts) else {
            return Ok(false);
        };
        let cacerts_str = cacerts.to_string_lossy();
        let mut cmd = Command::new(keytool);
        cmd.args(["-list", "-keystore", &cacerts_str, "-storepass", STORE_PASS]);
        let (ok, output) = try_run(cmd)?;
        Ok(ok && output.contains(&ca.fingerprint_colon_hex()))
    }

    fn install(&self, ca: &CaCert, gate: &mut PrivilegeGate) -> Result<()> {
        let keytool = self.keytool()?.to_string_lossy().into_owned();
        let cacerts = self
            .cacerts
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let pem_path = ca.pem_path.to_string_lossy();
        let cmd = gate.command(
            &keytool,
            &[
                "-importcert",
                "-noprompt",
                "-keystore",
                &cacerts,
                "-storepass",
                STORE_PASS,
                "-file",
                &pem_path,
                "-alias",
                &ca.nickname,
            ],
        );
        crate::store::run(cmd)?;
        Ok(())
    }

    fn uninstall(&self, ca: &CaCert, gate: &mut PrivilegeGate) -> Result<()> {
        self.keytool()?;
        // Detaching an alias that was never imported is a no-op
        if !self.is_installed(ca)? {
            debug!(alias = %ca.nickname, "CA not present in cacerts, nothing to remove");
            return Ok(());
        }
        let keytool = self.keytool()?.to_string_lossy().into_owned();
        let cacerts = self
            .cacerts
            .as_deref()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let cmd = gate.command(
            &keytool,
            &[
                "-delete",
                "-alias",
                &ca.nickname,
                "-keystore",
                &cacerts,
                "-storepass",
                STORE_PASS,
            ],
        );
        crate::store::run(cmd)?;
        Ok(())
    }
}
