//! Leaf certificate issuance under the local CA.
//!
//! Two entry points share one [`issue`] call: subject-list issuance, which
//! generates a fresh leaf key, and CSR issuance, which copies the
//! requester's public key and subject alternative names and writes a
//! certificate only.

use std::net::IpAddr;
use std::path::PathBuf;

use rcgen::{
    CertificateParams, CertificateSigningRequestParams, DistinguishedName, DnType,
    ExtendedKeyUsagePurpose, IsCa, KeyPair, KeyUsagePurpose, SanType,
};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use ::time::{Duration, OffsetDateTime};
use tracing::debug;
use x509_parser::prelude::*;

use crate::authority::{write_file, CaAuthority};
use crate::error::{CaError, Result};
use crate::subject::Subject;
use crate::KeyAlgorithm;

/// Leaf validity: 2 years and 3 months, always under the 825-day cap that
/// Apple platforms apply to all certificates including custom roots.
const LEAF_VALIDITY_DAYS: i64 = 730 + 90;

const LEAF_ORGANIZATION: &str = "certmint development certificate";

/// Password protecting generated PKCS#12 bundles. Fixed to the well-known
/// Java default so legacy consumers can open them without configuration.
pub const P12_PASSWORD: &str = "changeit";

/// Output path overrides. Unset paths fall back to the subject-derived
/// default names in the current directory.
#[derive(Debug, Clone, Default)]
pub struct OutputPaths {
    /// Certificate file override
    pub cert: Option<PathBuf>,
    /// Private key file override
    pub key: Option<PathBuf>,
    /// PKCS#12 bundle override
    pub p12: Option<PathBuf>,
}

/// Issuance request for a list of classified subjects.
#[derive(Debug, Clone, Default)]
pub struct SubjectRequest {
    /// Classified subjects, one SAN entry each, in order
    pub subjects: Vec<Subject>,
    /// Leaf key algorithm
    pub algorithm: KeyAlgorithm,
    /// Add the ClientAuth extended key usage
    pub client: bool,
    /// Emit a PKCS#12 bundle instead of the PEM pair
    pub pkcs12: bool,
    /// Output path overrides
    pub output: OutputPaths,
}

/// Issuance request for an externally supplied CSR.
#[derive(Debug, Clone)]
pub struct CsrRequest {
    /// PEM-encoded certificate signing request
    pub csr_pem: String,
    /// Output path overrides (only the certificate path applies)
    pub output: OutputPaths,
}

/// What to issue. CSR-based and subject-based issuance are separate
/// variants so a single request can never carry both.
#[derive(Debug, Clone)]
pub enum IssueRequest {
    /// Issue for classified subjects with a freshly generated key
    Subjects(SubjectRequest),
    /// Issue for an external CSR; the requester keeps their own key
    Csr(CsrRequest),
}

/// Paths and metadata of an issued leaf certificate.
#[derive(Debug, Clone)]
pub struct IssuedBundle {
    /// Certificate file, when a PEM certificate was written
    pub cert_path: Option<PathBuf>,
    /// Private key file, absent for CSR issuance and PKCS#12 output
    pub key_path: Option<PathBuf>,
    /// PKCS#12 bundle, when requested
    pub p12_path: Option<PathBuf>,
    /// Subject values the certificate is valid for, in order
    pub names: Vec<String>,
    /// Expiry timestamp
    pub not_after: OffsetDateTime,
}

/// Issue a leaf certificate under `ca`.
///
/// # Errors
///
/// Returns [`CaError::NoSubjects`] for an empty subject list,
/// [`CaError::Csr`] for a malformed or badly signed CSR, and generation or
/// I/O errors otherwise. Nothing is written on failure.
pub fn issue(ca: &CaAuthority, request: &IssueRequest) -> Result<IssuedBundle> {
    match request {
        IssueRequest::Subjects(req) => issue_from_subjects(ca, req),
        IssueRequest::Csr(req) => issue_from_csr(ca, req),
    }
}

/// Default output stem: first name with `:`, `/` and `*` made
/// filesystem-safe, `+N` for N additional names, `-client` for client
/// certificates.
pub fn default_stem(names: &[String], client: bool) -> String {
    let mut stem = names.first().map_or_else(
        || String::from("cert"),
        |first| {
            first
                .replace(':', "_")
                .replace('/', "_")
                .replace('*', "_wildcard")
        },
    );
    if names.len() > 1 {
        stem.push_str(&format!("+{}", names.len() - 1));
    }
    if client {
        stem.push_str("-client");
    }
    stem
}

fn issue_from_subjects(ca: &CaAuthority, req: &SubjectRequest) -> Result<IssuedBundle> {
    if req.subjects.is_empty() {
        return Err(CaError::NoSubjects);
    }

    let key = generate_leaf_key(req.algorithm)?;

    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, LEAF_ORGANIZATION);
    if req.pkcs12 {
        // Some PKCS#12 consumers (notably IIS) require a CommonName
        dn.push(DnType::CommonName, req.subjects[0].value());
    }

    let mut params = CertificateParams::default();
    params.distinguished_name = dn;
    params.is_ca = IsCa::NoCa;
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    if req.client {
        params
            .extended_key_usages
            .push(ExtendedKeyUsagePurpose::ClientAuth);
    }
    if req.subjects.iter().any(Subject::is_email) {
        params
            .extended_key_usages
            .push(ExtendedKeyUsagePurpose::EmailProtection);
    }

    params.subject_alt_names = req
        .subjects
        .iter()
        .map(san_for)
        .collect::<Result<Vec<SanType>>>()?;

    let now = OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + Duration::days(LEAF_VALIDITY_DAYS);
    let not_after = params.not_after;

    let cert = params
        .signed_by(&key, ca.issuer_cert(), ca.issuer_key())
        .map_err(|e| CaError::CertificateGeneration(e.to_string()))?;

    let names: Vec<String> = req.subjects.iter().map(Subject::value).collect();
    let stem = default_stem(&names, req.client);

    if req.pkcs12 {
        let p12_path = req
            .output
            .p12
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{stem}.p12")));
        write_p12(&p12_path, cert.der(), &key.serialize_der(), ca.cert_der())?;
        debug!(path = %p12_path.display(), "wrote PKCS#12 bundle");
        return Ok(IssuedBundle {
            cert_path: None,
            key_path: None,
            p12_path: Some(p12_path),
            names,
            not_after,
        });
    }

    let cert_path = req
        .output
        .cert
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{stem}.pem")));
    let key_path = req
        .output
        .key
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{stem}-key.pem")));

    write_file(&cert_path, cert.pem().as_bytes(), 0o644)?;
    write_file(&key_path, key.serialize_pem().as_bytes(), 0o600)?;
    debug!(cert = %cert_path.display(), key = %key_path.display(), "wrote certificate pair");

    Ok(IssuedBundle {
        cert_path: Some(cert_path),
        key_path: Some(key_path),
        p12_path: None,
        names,
        not_after,
    })
}

fn issue_from_csr(ca: &CaAuthority, req: &CsrRequest) -> Result<IssuedBundle> {
    let (names, has_email) = verify_csr(&req.csr_pem)?;

    let mut csr = CertificateSigningRequestParams::from_pem(&req.csr_pem)
        .map_err(|e| CaError::Csr(e.to_string()))?;

    // Usage policy is the CA's, not the requester's
    csr.params.is_ca = IsCa::NoCa;
    csr.params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyEncipherment,
    ];
    csr.params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
    if has_email {
        csr.params
            .extended_key_usages
            .push(ExtendedKeyUsagePurpose::EmailProtection);
    }
    let now = OffsetDateTime::now_utc();
    csr.params.not_before = now;
    csr.params.not_after = now + Duration::days(LEAF_VALIDITY_DAYS);
    let not_after = csr.params.not_after;

    let cert = csr
        .signed_by(ca.issuer_cert(), ca.issuer_key())
        .map_err(|e| CaError::CertificateGeneration(e.to_string()))?;

    let stem = default_stem(&names, false);
    let cert_path = req
        .output
        .cert
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("{stem}.pem")));
    write_file(&cert_path, cert.pem().as_bytes(), 0o644)?;
    debug!(cert = %cert_path.display(), "wrote certificate from CSR");

    Ok(IssuedBundle {
        cert_path: Some(cert_path),
        key_path: None,
        p12_path: None,
        names,
        not_after,
    })
}

/// Parse the CSR, check its self-signature, and collect the requested
/// names. A CSR with neither SANs nor a common name is rejected.
fn verify_csr(csr_pem: &str) -> Result<(Vec<String>, bool)> {
    let block = ::pem::parse(csr_pem).map_err(|e| CaError::Csr(e.to_string()))?;
    if block.tag() != "CERTIFICATE REQUEST" && block.tag() != "NEW CERTIFICATE REQUEST" {
        return Err(CaError::Csr(format!(
            "unexpected PEM block {:?}",
            block.tag()
        )));
    }
    let (_, csr) = X509CertificationRequest::from_der(block.contents())
        .map_err(|e| CaError::Csr(e.to_string()))?;
    csr.verify_signature()
        .map_err(|e| CaError::Csr(format!("signature verification failed: {e}")))?;

    let mut names = Vec::new();
    let mut has_email = false;
    if let Some(extensions) = csr.requested_extensions() {
        for extension in extensions {
            let ParsedExtension::SubjectAlternativeName(san) = extension else {
                continue;
            };
            for general_name in &san.general_names {
                match general_name {
                    GeneralName::DNSName(dns) => names.push((*dns).to_string()),
                    GeneralName::RFC822Name(email) => {
                        has_email = true;
                        names.push((*email).to_string());
                    }
                    GeneralName::URI(uri) => names.push((*uri).to_string()),
                    GeneralName::IPAddress(bytes) => {
                        if let Some(ip) = ip_from_bytes(bytes) {
                            names.push(ip.to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    if names.is_empty() {
        if let Some(cn) = csr
            .certification_request_info
            .subject
            .iter_common_name()
            .next()
            .and_then(|attr| attr.as_str().ok())
        {
            names.push(cn.to_string());
        }
    }
    if names.is_empty() {
        return Err(CaError::Csr(
            "the CSR requests no subject alternative names and has no common name".to_string(),
        ));
    }
    Ok((names, has_email))
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}

fn san_for(subject: &Subject) -> Result<SanType> {
    match subject {
        Subject::Ip(ip) => Ok(SanType::IpAddress(*ip)),
        Subject::Email(email) => Ok(SanType::Rfc822Name(ia5(email)?)),
        Subject::Uri(uri) => Ok(SanType::URI(ia5(uri)?)),
        Subject::Dns(name) => Ok(SanType::DnsName(ia5(name)?)),
    }
}

fn ia5(value: &str) -> Result<rcgen::Ia5String> {
    value
        .try_into()
        .map_err(|e: rcgen::Error| CaError::CertificateGeneration(e.to_string()))
}

fn generate_leaf_key(algorithm: KeyAlgorithm) -> Result<KeyPair> {
    match algorithm {
        KeyAlgorithm::EcdsaP256 => {
            KeyPair::generate().map_err(|e| CaError::KeyGeneration(e.to_string()))
        }
        KeyAlgorithm::Rsa2048 => {
            let mut rng = rand::thread_rng();
            let rsa_key = RsaPrivateKey::new(&mut rng, 2048)
                .map_err(|e| CaError::KeyGeneration(e.to_string()))?;
            let key_pem = rsa_key
                .to_pkcs8_pem(LineEnding::LF)
                .map_err(|e| CaError::KeyGeneration(e.to_string()))?;
            KeyPair::from_pem(&key_pem).map_err(|e| CaError::KeyGeneration(e.to_string()))
        }
    }
}

fn write_p12(
    path: &std::path::Path,
    cert_der: &[u8],
    key_der: &[u8],
    ca_der: &[u8],
) -> Result<()> {
    let pfx = p12::PFX::new(cert_der, key_der, Some(ca_der), P12_PASSWORD, "certmint")
        .ok_or_else(|| {
            CaError::CertificateGeneration("failed to assemble the PKCS#12 bundle".to_string())
        })?;
    write_file(path, &pfx.to_der(), 0o644)
}
