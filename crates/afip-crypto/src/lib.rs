//! # afip-crypto — Cryptographic Utilities for AFIP Onboarding
//!
//! Produces and parses the cryptographic artifacts needed to onboard with
//! AFIP's web-service suite:
//!
//! - RSA key-pair generation (PKCS#8 PEM, optionally passphrase-protected)
//! - PKCS#10 CSR construction from a validated Distinguished Name
//! - CSR and X.509 certificate read-back
//! - CMS (PKCS#7) signing of the WSAA login request envelope
//!
//! ## Security Invariant
//!
//! - Key sizes below 2048 bits are rejected at generation time — AFIP's
//!   documented minimum.
//! - A CSR can only be built from a [`DistinguishedName`] that has passed
//!   validation; the `serialNumber` attribute must carry the literal
//!   `CUIT ` prefix followed by exactly 11 digits.
//!
//! ## Crate Policy
//!
//! - Pure RustCrypto stack (`rsa`, `x509-cert`, `x509-parser`, `cms`);
//!   no bindings to system OpenSSL.
//! - All fallible paths return [`afip_core::AfipError`]; no `unwrap()`
//!   outside tests.

pub mod certificate;
pub mod cms;
pub mod csr;
pub mod dn;
pub mod keys;

pub use certificate::{extract_certificate_info, CertificateInfo};
pub use cms::{sign_message, sign_message_base64};
pub use csr::{extract_csr_dn, generate_csr};
pub use dn::DistinguishedName;
pub use keys::{generate_key_pair, load_private_key, MIN_KEY_BITS};
