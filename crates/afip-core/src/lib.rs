//! # afip-core — Foundational Types for the AFIP SDK
//!
//! Leaf crate of the workspace: every other crate depends on `afip-core`;
//! it depends on nothing internal. It defines the domain primitives shared
//! by the crypto utility, the WSAA ticket manager, and the service
//! dispatcher.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for domain primitives.** `Cuit` is a validated
//!    newtype — no bare strings for taxpayer identifiers anywhere in the
//!    workspace.
//! 2. **One error taxonomy.** [`AfipError`] carries every failure kind the
//!    SDK can surface (configuration, validation, file, authentication,
//!    SOAP fault, certificate, web-service), each with structured context
//!    that can be inspected without parsing the message string.
//! 3. **Fail at construction.** [`Credentials`] refuses to exist with a
//!    malformed CUIT or missing certificate/key files; downstream code
//!    never re-checks those invariants.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `afip-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod identity;

// Re-export primary types for ergonomic imports.
pub use config::{Credentials, Environment};
pub use error::{AfipError, AuthStage};
pub use identity::Cuit;
