//! # PKCS#10 CSR Construction and Read-Back
//!
//! CSRs are built with the RustCrypto `x509-cert` request builder and
//! signed PKCS#1 v1.5 / SHA-256, the profile AFIP's onboarding portal
//! accepts. Read-back goes through `x509-parser` and maps the subject
//! attributes onto the friendly [`DistinguishedName`] fields.

use std::str::FromStr;

use afip_core::AfipError;
use der::EncodePem;
use pkcs8::LineEnding;
use rsa::pkcs1v15::SigningKey;
use sha2::Sha256;
use x509_cert::builder::{Builder, RequestBuilder};
use x509_cert::name::Name;
use x509_parser::prelude::*;

use crate::dn::{
    DistinguishedName, OID_COMMON_NAME, OID_COUNTRY, OID_LOCALITY, OID_ORGANIZATION,
    OID_SERIAL_NUMBER, OID_STATE,
};
use crate::keys::load_private_key;

/// Build a PEM-encoded PKCS#10 certification request.
///
/// The DN is validated before anything is signed. Fails with a
/// Certificate error when the private key cannot be parsed or signing
/// fails.
pub fn generate_csr(
    key_pem: &str,
    passphrase: Option<&str>,
    dn: &DistinguishedName,
) -> Result<String, AfipError> {
    dn.validate()?;
    let key = load_private_key(key_pem, passphrase)?;

    let subject = Name::from_str(&rfc4514_subject(dn)).map_err(|e| AfipError::Certificate {
        reason: format!("subject encoding failed: {e}"),
    })?;

    let signer = SigningKey::<Sha256>::new(key);
    let builder = RequestBuilder::new(subject, &signer).map_err(|e| AfipError::Certificate {
        reason: format!("CSR builder initialization failed: {e}"),
    })?;
    let request = builder
        .build::<rsa::pkcs1v15::Signature>()
        .map_err(|e| AfipError::Certificate {
            reason: format!("CSR signing failed: {e}"),
        })?;

    request
        .to_pem(LineEnding::LF)
        .map_err(|e| AfipError::Certificate {
            reason: format!("CSR PEM encoding failed: {e}"),
        })
}

/// Extract the Distinguished Name from a CSR.
///
/// Accepts PEM text directly or a path to a PEM file. Unknown subject
/// attributes are ignored; missing ones come back as empty fields, so the
/// result can be checked with [`DistinguishedName::validate`].
pub fn extract_csr_dn(csr_path_or_text: &str) -> Result<DistinguishedName, AfipError> {
    let pem_text = if csr_path_or_text.contains("-----BEGIN") {
        csr_path_or_text.to_string()
    } else {
        std::fs::read_to_string(csr_path_or_text).map_err(|e| AfipError::Certificate {
            reason: format!("cannot read CSR file {csr_path_or_text}: {e}"),
        })?
    };

    let (_, pem) =
        x509_parser::pem::parse_x509_pem(pem_text.as_bytes()).map_err(|e| AfipError::Certificate {
            reason: format!("CSR is not valid PEM: {e}"),
        })?;
    let (_, csr) =
        X509CertificationRequest::from_der(&pem.contents).map_err(|e| AfipError::Certificate {
            reason: format!("CSR subject sequence cannot be decoded: {e}"),
        })?;

    let mut dn = DistinguishedName {
        country: String::new(),
        state: String::new(),
        locality: String::new(),
        organization: String::new(),
        common_name: String::new(),
        serial_number: String::new(),
    };
    for attr in csr.certification_request_info.subject.iter_attributes() {
        // Country arrives as PrintableString, the rest as UTF8String;
        // AttributeTypeAndValue::as_str accepts both (and IA5String).
        let value = attr.as_str().map_err(|e| AfipError::Certificate {
            reason: format!("subject attribute is not a string: {e}"),
        })?;
        match attr.attr_type().to_id_string().as_str() {
            OID_COUNTRY => dn.country = value.to_string(),
            OID_STATE => dn.state = value.to_string(),
            OID_LOCALITY => dn.locality = value.to_string(),
            OID_ORGANIZATION => dn.organization = value.to_string(),
            OID_COMMON_NAME => dn.common_name = value.to_string(),
            OID_SERIAL_NUMBER => dn.serial_number = value.to_string(),
            _ => {}
        }
    }
    Ok(dn)
}

/// Render the DN as an RFC 4514 string for the `x509-cert` subject parser.
fn rfc4514_subject(dn: &DistinguishedName) -> String {
    dn.attributes()
        .iter()
        .map(|(oid, value)| format!("{}={}", rdn_key(oid), escape_rdn_value(value)))
        .collect::<Vec<_>>()
        .join(",")
}

fn rdn_key(oid: &str) -> &str {
    match oid {
        OID_COUNTRY => "C",
        OID_STATE => "ST",
        OID_LOCALITY => "L",
        OID_ORGANIZATION => "O",
        OID_COMMON_NAME => "CN",
        other => other,
    }
}

/// Escape an attribute value per RFC 4514 section 2.4.
fn escape_rdn_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let chars: Vec<char> = value.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        let needs_escape = matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=')
            || (i == 0 && (*c == ' ' || *c == '#'))
            || (i == chars.len() - 1 && *c == ' ');
        if needs_escape {
            out.push('\\');
        }
        out.push(*c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key_pair;

    fn sample_dn() -> DistinguishedName {
        DistinguishedName {
            country: "AR".into(),
            state: "Córdoba".into(),
            locality: "Córdoba".into(),
            organization: "Acme".into(),
            common_name: "acme-ws".into(),
            serial_number: "CUIT 12345678901".into(),
        }
    }

    #[test]
    fn csr_round_trip_preserves_dn() {
        let key = generate_key_pair(2048, None).expect("key");
        let csr = generate_csr(&key, None, &sample_dn()).expect("csr");
        assert!(csr.starts_with("-----BEGIN CERTIFICATE REQUEST-----"));

        let extracted = extract_csr_dn(&csr).expect("extract");
        assert_eq!(extracted, sample_dn());
        extracted.validate().expect("extracted DN is valid");
    }

    #[test]
    fn csr_can_be_extracted_from_a_file() {
        let key = generate_key_pair(2048, None).expect("key");
        let csr = generate_csr(&key, None, &sample_dn()).expect("csr");

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("request.csr");
        std::fs::write(&path, &csr).expect("write");

        let extracted = extract_csr_dn(path.to_str().expect("utf8 path")).expect("extract");
        assert_eq!(extracted, sample_dn());
    }

    #[test]
    fn invalid_dn_is_rejected_before_signing() {
        let key = generate_key_pair(2048, None).expect("key");
        let mut dn = sample_dn();
        dn.serial_number = "CUIT 123".into();
        let err = generate_csr(&key, None, &dn).expect_err("must fail");
        assert!(matches!(err, AfipError::Validation { ref field, .. } if field == "serialNumber"));
    }

    #[test]
    fn garbage_input_is_a_certificate_error() {
        let err = extract_csr_dn("-----BEGIN CERTIFICATE REQUEST-----\nnot base64\n-----END CERTIFICATE REQUEST-----\n")
            .expect_err("must fail");
        assert!(matches!(err, AfipError::Certificate { .. }));
    }

    #[test]
    fn missing_file_is_a_certificate_error() {
        let err = extract_csr_dn("/nonexistent/request.csr").expect_err("must fail");
        assert!(matches!(err, AfipError::Certificate { .. }));
    }

    #[test]
    fn rdn_values_are_escaped() {
        assert_eq!(escape_rdn_value("Acme, S.A."), "Acme\\, S.A.");
        assert_eq!(escape_rdn_value(" leading"), "\\ leading");
        assert_eq!(escape_rdn_value("trailing "), "trailing\\ ");
        assert_eq!(escape_rdn_value("#hash"), "\\#hash");
    }
}
