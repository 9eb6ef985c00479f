//! # Shared CLI Arguments
//!
//! Credential flags reused by every subcommand that talks to AFIP.

use std::path::PathBuf;

use afip_core::{Credentials, Cuit, Environment};
use clap::Args;

/// Credential and environment flags.
#[derive(Args, Debug)]
pub struct CredentialArgs {
    /// Taxpayer CUIT (11 digits).
    #[arg(long)]
    pub cuit: String,

    /// Target the production environment instead of homologación.
    #[arg(long)]
    pub production: bool,

    /// Path to the X.509 certificate (PEM).
    #[arg(long)]
    pub certificate: PathBuf,

    /// Path to the RSA private key (PEM).
    #[arg(long)]
    pub private_key: PathBuf,

    /// Passphrase protecting the private key, when encrypted.
    #[arg(long)]
    pub passphrase: Option<String>,

    /// Directory for cached authorization tickets.
    #[arg(long, default_value = "cache")]
    pub cache_dir: PathBuf,

    /// Directory holding the built-in WSDL files.
    #[arg(long, default_value = "resources")]
    pub resources_dir: PathBuf,

    /// Extra directory searched for WSDL files before the built-in ones.
    #[arg(long)]
    pub wsdl_dir: Option<PathBuf>,
}

impl CredentialArgs {
    /// Assemble a validated [`Credentials`] from the parsed flags.
    pub fn into_credentials(self) -> anyhow::Result<Credentials> {
        let environment = if self.production {
            Environment::Production
        } else {
            Environment::Testing
        };
        let mut credentials = Credentials::new(
            Cuit::new(&self.cuit)?,
            environment,
            self.certificate,
            self.private_key,
        )?
        .with_resources_dir(self.resources_dir)
        .with_cache_dir(self.cache_dir);
        if let Some(passphrase) = self.passphrase {
            credentials = credentials.with_key_passphrase(passphrase);
        }
        if let Some(dir) = self.wsdl_dir {
            credentials = credentials.with_custom_wsdl_dir(dir);
        }
        Ok(credentials)
    }
}
