//! # Genkey Subcommand
//!
//! RSA key-pair generation for AFIP certificate enrolment.

use std::path::PathBuf;

use afip_crypto::MIN_KEY_BITS;
use clap::Args;

/// Arguments for the genkey subcommand.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Output path for the PEM-encoded private key.
    #[arg(long, default_value = "private.key")]
    pub output: PathBuf,

    /// Key size in bits (minimum 2048).
    #[arg(long, default_value_t = MIN_KEY_BITS)]
    pub bits: usize,

    /// Encrypt the key with this passphrase.
    #[arg(long)]
    pub passphrase: Option<String>,
}

/// Generate a private key and write it to the output path.
pub fn run(args: KeygenArgs) -> anyhow::Result<()> {
    tracing::info!(bits = args.bits, "generating RSA key pair");
    let pem = afip_crypto::generate_key_pair(args.bits, args.passphrase.as_deref())?;
    std::fs::write(&args.output, pem)?;
    println!("private key written to {}", args.output.display());
    Ok(())
}
