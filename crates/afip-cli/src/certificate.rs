//! # Inspect-Cert Subcommand
//!
//! X.509 certificate read-back: serial, issuer, subject, validity window.

use std::path::PathBuf;

use clap::Args;

/// Arguments for the inspect-cert subcommand.
#[derive(Args, Debug)]
pub struct InspectCertArgs {
    /// Path to the PEM certificate file.
    pub certificate: PathBuf,
}

/// Print the identifying fields of a certificate.
pub fn run(args: InspectCertArgs) -> anyhow::Result<()> {
    let pem = std::fs::read_to_string(&args.certificate)?;
    let info = afip_crypto::extract_certificate_info(&pem)?;
    println!("version:             {}", info.version);
    println!("serial:              {}", info.serial);
    println!("issuer:              {}", info.issuer);
    println!("subject:             {}", info.subject);
    println!("not before:          {}", info.not_before.to_rfc3339());
    println!("not after:           {}", info.not_after.to_rfc3339());
    println!("signature algorithm: {}", info.signature_algorithm);
    Ok(())
}
