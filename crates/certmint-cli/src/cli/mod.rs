//! CLI argument parsing and dispatch.

pub mod args;

use anyhow::Result;
use args::Cli;
use clap::Parser;

use crate::config::Config;

/// Run the CLI application.
pub fn run() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::load()?;

    let options = certmint::Options {
        install: cli.install,
        uninstall: cli.uninstall,
        caroot_query: cli.caroot,
        csr: cli.csr,
        subjects: cli.subjects,
        ecdsa: cli.ecdsa || config.ecdsa,
        client: cli.client,
        pkcs12: cli.pkcs12,
        cert_file: cli.cert_file,
        key_file: cli.key_file,
        p12_file: cli.p12_file,
        trust_stores: config.trust_stores,
    };

    certmint::run(&options)?;
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
