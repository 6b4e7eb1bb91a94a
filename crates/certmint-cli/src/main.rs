//! certmint - locally-trusted development certificates.

use std::process;

fn main() {
    if let Err(err) = certmint_cli::run() {
        eprintln!("ERROR: {err:#}");
        process::exit(1);
    }
}
