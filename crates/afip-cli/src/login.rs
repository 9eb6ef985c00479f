//! # Login Subcommand
//!
//! WSAA authentication: obtain (or reuse) an authorization ticket for a
//! service and print its token, sign, and validity window.

use afip_client::TicketManager;
use clap::Args;

use crate::common::CredentialArgs;

/// Arguments for the login subcommand.
#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Service to authorize against (e.g. `wsfe`).
    #[arg(long, default_value = "wsfe")]
    pub service: String,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

/// Fetch a ticket, renewing through WSAA when the cache has no valid one.
pub fn run(args: LoginArgs) -> anyhow::Result<()> {
    let credentials = args.credentials.into_credentials()?;
    let mut manager = TicketManager::new(credentials);
    let ticket = manager.get_ticket(&args.service)?;
    println!("token:      {}", ticket.token());
    println!("sign:       {}", ticket.sign());
    println!("generated:  {}", ticket.generation_time().to_rfc3339());
    println!("expires:    {}", ticket.expiration_time().to_rfc3339());
    Ok(())
}
