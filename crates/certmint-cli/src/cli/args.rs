//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
EXAMPLES:
    $ certmint --install
    Install the local CA in the system trust store.

    $ certmint example.org
    Generate \"example.org.pem\" and \"example.org-key.pem\".

    $ certmint example.com myapp.dev localhost 127.0.0.1 ::1
    Generate \"example.com+4.pem\" and \"example.com+4-key.pem\".

    $ certmint \"*.example.it\"
    Generate \"_wildcard.example.it.pem\" and \"_wildcard.example.it-key.pem\".

    $ certmint --uninstall
    Uninstall the local CA (but do not delete it).

ENVIRONMENT:
    CAROOT
        Set the CA certificate and key storage location. (This allows
        maintaining multiple local CAs in parallel.)

    TRUST_STORES
        A comma-separated list of trust stores to install the local
        root CA into. Options are: \"system\", \"java\" and \"nss\" (includes
        Firefox). Autodetected by default.
";

/// A simple zero-config tool to make locally-trusted development
/// certificates
#[derive(Parser, Debug)]
#[command(name = "certmint")]
#[command(author, version, about, long_about = None)]
#[command(after_help = AFTER_HELP)]
pub struct Cli {
    /// Install the local CA in the trust stores
    #[arg(long)]
    pub install: bool,

    /// Uninstall the local CA from the trust stores (but do not delete it)
    #[arg(long)]
    pub uninstall: bool,

    /// Print the CA certificate and key storage location
    #[arg(long)]
    pub caroot: bool,

    /// Generate a certificate based on the supplied CSR. Conflicts with
    /// all other flags and arguments except --install and --cert-file
    #[arg(long, value_name = "FILE")]
    pub csr: Option<PathBuf>,

    /// Customize the output certificate path
    #[arg(long = "cert-file", value_name = "FILE")]
    pub cert_file: Option<PathBuf>,

    /// Customize the output key path
    #[arg(long = "key-file", value_name = "FILE")]
    pub key_file: Option<PathBuf>,

    /// Customize the output PKCS#12 path
    #[arg(long = "p12-file", value_name = "FILE")]
    pub p12_file: Option<PathBuf>,

    /// Generate a certificate for client authentication
    #[arg(long)]
    pub client: bool,

    /// Generate a certificate with an ECDSA key
    #[arg(long)]
    pub ecdsa: bool,

    /// Generate a PKCS#12 bundle (".p12", also known as ".pfx") containing
    /// certificate and key for legacy applications
    #[arg(long)]
    pub pkcs12: bool,

    /// Hostnames, IP addresses, URLs or email addresses to issue for
    #[arg(value_name = "SUBJECT")]
    pub subjects: Vec<String>,
}
