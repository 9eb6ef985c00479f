//! # Call and Services Subcommands
//!
//! Ad-hoc invocation of registered web-service operations, and a listing
//! of the built-in service catalogue.

use afip_client::{ServiceDispatcher, ServiceRegistry};
use clap::Args;
use serde_json::Value;

use crate::common::CredentialArgs;

/// Arguments for the call subcommand.
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Registered service name (e.g. `wsfe`).
    #[arg(long)]
    pub service: String,

    /// Remote operation name (e.g. `FEDummy`).
    #[arg(long)]
    pub operation: String,

    /// Operation parameters as a JSON object.
    #[arg(long, default_value = "{}")]
    pub params: String,

    /// Inject the `Auth` block (token, sign, CUIT) into the parameters,
    /// obtaining a ticket first.
    #[arg(long)]
    pub with_auth: bool,

    #[command(flatten)]
    pub credentials: CredentialArgs,
}

/// Arguments for the services subcommand.
#[derive(Args, Debug)]
pub struct ServicesArgs {}

/// Execute one operation and print the decoded result as JSON.
pub fn call(args: CallArgs) -> anyhow::Result<()> {
    let mut params: Value = serde_json::from_str(&args.params)?;
    let credentials = args.credentials.into_credentials()?;
    let registry = ServiceRegistry::builtin();
    let mut dispatcher = ServiceDispatcher::for_service(credentials, &registry, &args.service)?;

    if args.with_auth {
        let auth = dispatcher.auth_params()?;
        let object = params
            .as_object_mut()
            .ok_or_else(|| anyhow::anyhow!("--with-auth requires --params to be a JSON object"))?;
        if let Value::Object(auth) = auth {
            object.extend(auth);
        }
    }

    let result = dispatcher.execute(&args.operation, &params)?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// List the built-in service registrations.
pub fn services(_args: ServicesArgs) -> anyhow::Result<()> {
    let registry = ServiceRegistry::builtin();
    for name in registry.names() {
        let registration = registry.get(name)?;
        println!(
            "{name}: SOAP {} ({})",
            registration.soap_version,
            registration.endpoint_for(afip_core::Environment::Production)
        );
    }
    Ok(())
}
