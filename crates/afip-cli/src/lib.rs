//! # afip-cli — AFIP Web-Service Command-Line Interface
//!
//! Operator tooling around the SDK crates: key and CSR generation for
//! certificate enrolment, certificate inspection, WSAA ticket management,
//! and ad-hoc calls against registered services.
//!
//! ## Subcommands
//!
//! - `genkey` — RSA key-pair generation (PKCS#8 PEM)
//! - `gencsr` — PKCS#10 certification-request generation
//! - `inspect-csr` — CSR subject read-back
//! - `inspect-cert` — X.509 certificate field read-back
//! - `login` — WSAA authentication and ticket caching
//! - `call` — invoke one operation on a registered service
//! - `services` — list the built-in service catalogue
//!
//! ## Crate Policy
//!
//! - CLI construction (argument parsing) is separated from business logic.
//! - Handler functions delegate to the domain crates — no SOAP or
//!   cryptography logic lives here.

pub mod certificate;
pub mod common;
pub mod csr;
pub mod invoke;
pub mod keys;
pub mod login;
