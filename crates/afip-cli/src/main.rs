//! # afip CLI Entry Point
//!
//! Assembles subcommands and dispatches to handler modules.

use clap::Parser;

/// AFIP web-service toolchain.
///
/// Generates enrolment material (keys, CSRs), inspects certificates,
/// authenticates against WSAA, and invokes registered web services.
#[derive(Parser, Debug)]
#[command(name = "afip", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Generate an RSA key pair.
    Genkey(afip_cli::keys::KeygenArgs),
    /// Generate a PKCS#10 certification request.
    Gencsr(afip_cli::csr::CsrArgs),
    /// Print the subject DN of a certification request.
    InspectCsr(afip_cli::csr::InspectCsrArgs),
    /// Print the identifying fields of an X.509 certificate.
    InspectCert(afip_cli::certificate::InspectCertArgs),
    /// Authenticate against WSAA and print the ticket.
    Login(afip_cli::login::LoginArgs),
    /// Invoke one operation on a registered service.
    Call(afip_cli::invoke::CallArgs),
    /// List the built-in service registrations.
    Services(afip_cli::invoke::ServicesArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Genkey(args) => afip_cli::keys::run(args),
        Commands::Gencsr(args) => afip_cli::csr::generate(args),
        Commands::InspectCsr(args) => afip_cli::csr::inspect(args),
        Commands::InspectCert(args) => afip_cli::certificate::run(args),
        Commands::Login(args) => afip_cli::login::run(args),
        Commands::Call(args) => afip_cli::invoke::call(args),
        Commands::Services(args) => afip_cli::invoke::services(args),
    }
}
