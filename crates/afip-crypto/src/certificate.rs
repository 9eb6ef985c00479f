//! # X.509 Certificate Read-Back
//!
//! Once AFIP issues a certificate for an onboarding CSR, callers need to
//! inspect it: confirm the subject matches the requested DN, check the
//! validity window before deployment, and record the serial number. Only
//! read-back lives here — issuance belongs to the authority.

use afip_core::AfipError;
use chrono::{DateTime, Utc};
use x509_parser::prelude::*;

/// Fields extracted from an X.509 certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    /// X.509 version (3 for every certificate AFIP issues).
    pub version: u32,
    /// Serial number, decimal.
    pub serial: String,
    /// Issuer DN, RFC 4514 rendering.
    pub issuer: String,
    /// Subject DN, RFC 4514 rendering.
    pub subject: String,
    /// Start of the validity window.
    pub not_before: DateTime<Utc>,
    /// End of the validity window.
    pub not_after: DateTime<Utc>,
    /// Signature algorithm name, or its dotted OID when unknown.
    pub signature_algorithm: String,
}

/// Parse a PEM certificate and return its identifying fields.
///
/// Fails with a Certificate error on malformed input.
pub fn extract_certificate_info(pem_text: &str) -> Result<CertificateInfo, AfipError> {
    let (_, pem) =
        x509_parser::pem::parse_x509_pem(pem_text.as_bytes()).map_err(|e| AfipError::Certificate {
            reason: format!("certificate is not valid PEM: {e}"),
        })?;
    let (_, cert) = parse_x509_certificate(&pem.contents).map_err(|e| AfipError::Certificate {
        reason: format!("certificate cannot be decoded: {e}"),
    })?;

    let not_before = timestamp_to_utc(cert.validity().not_before.timestamp())?;
    let not_after = timestamp_to_utc(cert.validity().not_after.timestamp())?;

    Ok(CertificateInfo {
        // X509Version is zero-based on the wire; report the human version.
        version: cert.version().0 + 1,
        serial: cert.tbs_certificate.serial.to_string(),
        issuer: cert.issuer().to_string(),
        subject: cert.subject().to_string(),
        not_before,
        not_after,
        signature_algorithm: signature_algorithm_name(
            &cert.signature_algorithm.algorithm.to_id_string(),
        ),
    })
}

fn timestamp_to_utc(ts: i64) -> Result<DateTime<Utc>, AfipError> {
    DateTime::<Utc>::from_timestamp(ts, 0).ok_or_else(|| AfipError::Certificate {
        reason: format!("validity timestamp {ts} out of range"),
    })
}

/// Map the RSA signature OIDs AFIP uses to their conventional names.
fn signature_algorithm_name(oid: &str) -> String {
    match oid {
        "1.2.840.113549.1.1.5" => "sha1WithRSAEncryption".into(),
        "1.2.840.113549.1.1.11" => "sha256WithRSAEncryption".into(),
        "1.2.840.113549.1.1.12" => "sha384WithRSAEncryption".into(),
        "1.2.840.113549.1.1.13" => "sha512WithRSAEncryption".into(),
        other => other.to_string(),
    }
}
