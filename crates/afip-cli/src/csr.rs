//! # CSR Subcommands
//!
//! PKCS#10 certification-request generation and read-back.

use std::path::PathBuf;

use afip_crypto::DistinguishedName;
use clap::Args;

/// Arguments for the gencsr subcommand.
#[derive(Args, Debug)]
pub struct CsrArgs {
    /// Path to the PEM private key to sign the request with.
    #[arg(long)]
    pub private_key: PathBuf,

    /// Passphrase protecting the private key, when encrypted.
    #[arg(long)]
    pub passphrase: Option<String>,

    /// Output path for the PEM-encoded request.
    #[arg(long, default_value = "request.csr")]
    pub output: PathBuf,

    /// Taxpayer CUIT (11 digits); rendered as `serialNumber=CUIT <n>`.
    #[arg(long)]
    pub cuit: String,

    /// Organization (company or taxpayer name).
    #[arg(long)]
    pub organization: String,

    /// Common name (system alias registered with AFIP).
    #[arg(long)]
    pub common_name: String,

    /// State or province.
    #[arg(long, default_value = "Ciudad Autonoma de Buenos Aires")]
    pub state: String,

    /// Locality.
    #[arg(long, default_value = "Buenos Aires")]
    pub locality: String,

    /// ISO country code.
    #[arg(long, default_value = "AR")]
    pub country: String,
}

/// Arguments for the inspect-csr subcommand.
#[derive(Args, Debug)]
pub struct InspectCsrArgs {
    /// Path to the PEM request file.
    pub csr: PathBuf,
}

/// Build a CSR from the flags and write it to the output path.
pub fn generate(args: CsrArgs) -> anyhow::Result<()> {
    let dn = DistinguishedName::for_cuit(
        &args.cuit,
        args.organization,
        args.common_name,
        args.state,
        args.locality,
        args.country,
    )?;
    let key_pem = std::fs::read_to_string(&args.private_key)?;
    let csr = afip_crypto::generate_csr(&key_pem, args.passphrase.as_deref(), &dn)?;
    std::fs::write(&args.output, csr)?;
    println!("certification request written to {}", args.output.display());
    Ok(())
}

/// Print the subject DN of an existing CSR.
pub fn inspect(args: InspectCsrArgs) -> anyhow::Result<()> {
    let dn = afip_crypto::extract_csr_dn(&args.csr.display().to_string())?;
    println!("country:       {}", dn.country);
    println!("state:         {}", dn.state);
    println!("locality:      {}", dn.locality);
    println!("organization:  {}", dn.organization);
    println!("common name:   {}", dn.common_name);
    println!("serial number: {}", dn.serial_number);
    Ok(())
}
