//! Root CA materialization and loading.
//!
//! The root pair lives under a single CAROOT directory and is created as a
//! pair or loaded as a pair. The authority never regenerates on its own;
//! removing both files is the only way to get a fresh CA.

use std::fs;
use std::path::{Path, PathBuf};

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DistinguishedName, DnType, IsCa, KeyPair,
    KeyUsagePurpose,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::error::{CaError, Result};

/// Root certificate file name under CAROOT.
pub const ROOT_CERT_FILE: &str = "rootCA.pem";
/// Root private key file name under CAROOT.
pub const ROOT_KEY_FILE: &str = "rootCA-key.pem";

/// Root CA validity window (10 years).
const CA_VALIDITY_DAYS: i64 = 3650;

const CA_ORGANIZATION: &str = "certmint development CA";

/// The local certificate authority: root certificate plus signing key.
pub struct CaAuthority {
    root: PathBuf,
    cert: Certificate,
    key: KeyPair,
    cert_pem: String,
    cert_der: Vec<u8>,
    serial: String,
    created: bool,
}

impl std::fmt::Debug for CaAuthority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaAuthority")
            .field("root", &self.root)
            .field("serial", &self.serial)
            .field("created", &self.created)
            .finish_non_exhaustive()
    }
}

impl CaAuthority {
    /// Load the CA under `root`, creating it when neither file exists.
    ///
    /// # Errors
    ///
    /// Returns [`CaError::InconsistentState`] when exactly one of the two
    /// files is present, and I/O or parse errors otherwise. These are fatal
    /// for the whole run.
    pub fn load_or_create(root: &Path) -> Result<Self> {
        let cert_path = root.join(ROOT_CERT_FILE);
        let key_path = root.join(ROOT_KEY_FILE);
        match (cert_path.exists(), key_path.exists()) {
            (true, true) => Self::load(root, &cert_path, &key_path),
            (false, false) => Self::create(root, &cert_path, &key_path),
            (true, false) => Err(CaError::InconsistentState {
                present: ROOT_CERT_FILE,
                missing: ROOT_KEY_FILE,
            }),
            (false, true) => Err(CaError::InconsistentState {
                present: ROOT_KEY_FILE,
                missing: ROOT_CERT_FILE,
            }),
        }
    }

    fn load(root: &Path, cert_path: &Path, key_path: &Path) -> Result<Self> {
        debug!(root = %root.display(), "loading existing CA");
        let cert_pem =
            fs::read_to_string(cert_path).map_err(|e| CaError::io("read", cert_path, e))?;
        let key_pem = fs::read_to_string(key_path).map_err(|e| CaError::io("read", key_path, e))?;

        let key = KeyPair::from_pem(&key_pem).map_err(|e| CaError::Parse {
            what: "CA private key",
            reason: e.to_string(),
        })?;
        let params = CertificateParams::from_ca_cert_pem(&cert_pem).map_err(|e| CaError::Parse {
            what: "CA certificate",
            reason: e.to_string(),
        })?;
        // Rebuild a signer over the stored parameters; the on-disk PEM stays
        // the source of truth for everything shown to trust stores.
        let cert = params
            .self_signed(&key)
            .map_err(|e| CaError::CertificateGeneration(e.to_string()))?;

        Self::finish(root, cert, key, cert_pem, false)
    }

    fn create(root: &Path, cert_path: &Path, key_path: &Path) -> Result<Self> {
        debug!(root = %root.display(), "generating new CA");
        fs::create_dir_all(root).map_err(|e| CaError::io("create", root, e))?;

        // The CA key algorithm is fixed regardless of the leaf choice.
        let key = KeyPair::generate().map_err(|e| CaError::KeyGeneration(e.to_string()))?;

        let identity = local_identity();
        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationName, CA_ORGANIZATION);
        dn.push(DnType::OrganizationalUnitName, identity.clone());
        dn.push(DnType::CommonName, format!("certmint {identity}"));

        let mut params = CertificateParams::default();
        params.distinguished_name = dn;
        // Signs leaves only, never another CA
        params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let now = OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + Duration::days(CA_VALIDITY_DAYS);

        let cert = params
            .self_signed(&key)
            .map_err(|e| CaError::CertificateGeneration(e.to_string()))?;
        let cert_pem = cert.pem();

        write_file(cert_path, cert_pem.as_bytes(), 0o644)?;
        write_file(key_path, key.serialize_pem().as_bytes(), 0o600)?;

        Self::finish(root, cert, key, cert_pem, true)
    }

    fn finish(
        root: &Path,
        cert: Certificate,
        key: KeyPair,
        cert_pem: String,
        created: bool,
    ) -> Result<Self> {
        let block = pem::parse(&cert_pem).map_err(|e| CaError::Parse {
            what: "CA certificate",
            reason: e.to_string(),
        })?;
        let cert_der = block.contents().to_vec();
        let serial = parse_serial(&cert_der)?;
        Ok(Self {
            root: root.to_path_buf(),
            cert,
            key,
            cert_pem,
            cert_der,
            serial,
            created,
        })
    }

    /// The CAROOT directory this authority lives under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the root certificate file.
    pub fn cert_path(&self) -> PathBuf {
        self.root.join(ROOT_CERT_FILE)
    }

    /// Path of the root key file.
    pub fn key_path(&self) -> PathBuf {
        self.root.join(ROOT_KEY_FILE)
    }

    /// PEM of the root certificate, exactly as stored on disk.
    pub fn cert_pem(&self) -> &str {
        &self.cert_pem
    }

    /// DER of the root certificate.
    pub fn cert_der(&self) -> &[u8] {
        &self.cert_der
    }

    /// Lowercase hex SHA-256 of the root certificate DER.
    pub fn fingerprint(&self) -> String {
        let digest = ring::digest::digest(&ring::digest::SHA256, &self.cert_der);
        hex::encode(digest.as_ref())
    }

    /// Decimal serial number of the root certificate.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Nickname identifying this CA in NSS databases and Java keystores.
    /// Unique per generated root so parallel CAROOTs never collide.
    pub fn nickname(&self) -> String {
        format!("certmint development CA {}", self.serial)
    }

    /// Whether this call materialized a fresh CA.
    pub const fn was_created(&self) -> bool {
        self.created
    }

    pub(crate) fn issuer_cert(&self) -> &Certificate {
        &self.cert
    }

    pub(crate) fn issuer_key(&self) -> &KeyPair {
        &self.key
    }
}

/// `user@host`, giving each developer machine a distinguishable CA subject.
fn local_identity() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| String::from("unknown"));
    let host = hostname::get().map_or_else(
        |_| String::from("unknown"),
        |h| h.to_string_lossy().into_owned(),
    );
    format!("{user}@{host}")
}

fn parse_serial(der: &[u8]) -> Result<String> {
    let (_, cert) = x509_parser::parse_x509_certificate(der).map_err(|e| CaError::Parse {
        what: "CA certificate",
        reason: e.to_string(),
    })?;
    Ok(cert.tbs_certificate.serial.to_string())
}

/// Write a file and clamp its permissions in one place.
pub(crate) fn write_file(path: &Path, bytes: &[u8], mode: u32) -> Result<()> {
    fs::write(path, bytes).map_err(|e| CaError::io("write", path, e))?;
    set_permissions(path, mode)
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|e| CaError::io("set permissions on", path, e))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
