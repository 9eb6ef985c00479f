//! # CMS (PKCS#7) Signing
//!
//! The WSAA login flow submits a CMS `SignedData` structure wrapping the
//! login request envelope, signed with the onboarded certificate and its
//! private key. The authentication endpoint expects the DER structure
//! base64-encoded, SHA-256 digest, signer identified by issuer and serial,
//! with the signing certificate embedded.

use afip_core::AfipError;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use cms::builder::{SignedDataBuilder, SignerInfoBuilder};
use cms::cert::{CertificateChoices, IssuerAndSerialNumber};
use cms::signed_data::{EncapsulatedContentInfo, SignerIdentifier};
use const_oid::db::rfc5911::ID_DATA;
use const_oid::db::rfc5912::ID_SHA_256;
use der::{Any, DecodePem, Encode, Tag};
use rsa::pkcs1v15::SigningKey;
use sha2::Sha256;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::Certificate;

use crate::keys::load_private_key;

/// Sign `data` as CMS `SignedData` and return the DER encoding.
///
/// `cert_pem` and `key_pem` are PEM text (not paths). Fails with a
/// Certificate error when the certificate or key cannot be parsed or the
/// signature cannot be produced.
pub fn sign_message(
    data: &[u8],
    cert_pem: &str,
    key_pem: &str,
    passphrase: Option<&str>,
) -> Result<Vec<u8>, AfipError> {
    let certificate =
        Certificate::from_pem(cert_pem.as_bytes()).map_err(|e| AfipError::Certificate {
            reason: format!("signing certificate cannot be parsed: {e}"),
        })?;
    let key = load_private_key(key_pem, passphrase)?;
    let signer = SigningKey::<Sha256>::new(key);

    let content = EncapsulatedContentInfo {
        econtent_type: ID_DATA,
        econtent: Some(
            Any::new(Tag::OctetString, data.to_vec()).map_err(|e| AfipError::Certificate {
                reason: format!("content encapsulation failed: {e}"),
            })?,
        ),
    };

    let digest_algorithm = AlgorithmIdentifierOwned {
        oid: ID_SHA_256,
        parameters: None,
    };
    let sid = SignerIdentifier::IssuerAndSerialNumber(IssuerAndSerialNumber {
        issuer: certificate.tbs_certificate.issuer.clone(),
        serial_number: certificate.tbs_certificate.serial_number.clone(),
    });
    let signer_info =
        SignerInfoBuilder::new(&signer, sid, digest_algorithm.clone(), &content, None).map_err(
            |e| AfipError::Certificate {
                reason: format!("signer info construction failed: {e}"),
            },
        )?;

    let mut builder = SignedDataBuilder::new(&content);
    let content_info = builder
        .add_digest_algorithm(digest_algorithm)
        .map_err(|e| AfipError::Certificate {
            reason: format!("digest algorithm registration failed: {e}"),
        })?
        .add_certificate(CertificateChoices::Certificate(certificate))
        .map_err(|e| AfipError::Certificate {
            reason: format!("certificate embedding failed: {e}"),
        })?
        .add_signer_info::<SigningKey<Sha256>, rsa::pkcs1v15::Signature>(signer_info)
        .map_err(|e| AfipError::Certificate {
            reason: format!("CMS signing failed: {e}"),
        })?
        .build()
        .map_err(|e| AfipError::Certificate {
            reason: format!("CMS assembly failed: {e}"),
        })?;

    content_info.to_der().map_err(|e| AfipError::Certificate {
        reason: format!("CMS DER encoding failed: {e}"),
    })
}

/// Sign `data` and return the base64 of the DER `SignedData`, the exact
/// payload shape the WSAA `loginCms` operation takes.
pub fn sign_message_base64(
    data: &[u8],
    cert_pem: &str,
    key_pem: &str,
    passphrase: Option<&str>,
) -> Result<String, AfipError> {
    Ok(BASE64.encode(sign_message(data, cert_pem, key_pem, passphrase)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::generate_key_pair;
    use cms::content_info::ContentInfo;
    use const_oid::db::rfc5911::ID_SIGNED_DATA;
    use der::Decode;
    use pkcs8::LineEnding;
    use der::EncodePem;
    use rsa::pkcs8::EncodePublicKey;
    use std::str::FromStr;
    use std::time::Duration;
    use x509_cert::builder::{Builder, CertificateBuilder, Profile};
    use x509_cert::name::Name;
    use x509_cert::serial_number::SerialNumber;
    use x509_cert::spki::SubjectPublicKeyInfoOwned;
    use x509_cert::time::Validity;

    /// Self-signed certificate + key pair for exercising the signer.
    fn test_identity() -> (String, String) {
        let key_pem = generate_key_pair(2048, None).expect("key");
        let key = load_private_key(&key_pem, None).expect("load");
        let signer = SigningKey::<Sha256>::new(key.clone());

        let spki_der = key
            .to_public_key()
            .to_public_key_der()
            .expect("public key der");
        let spki = SubjectPublicKeyInfoOwned::try_from(spki_der.as_bytes()).expect("spki");
        let subject = Name::from_str("CN=acme-ws,O=Acme,C=AR").expect("subject");
        let validity = Validity::from_now(Duration::from_secs(3600)).expect("validity");

        let builder = CertificateBuilder::new(
            Profile::Root,
            SerialNumber::from(1u32),
            validity,
            subject,
            spki,
            &signer,
        )
        .expect("certificate builder");
        let certificate = builder
            .build::<rsa::pkcs1v15::Signature>()
            .expect("self-signed certificate");
        let cert_pem = certificate.to_pem(LineEnding::LF).expect("cert pem");
        (cert_pem, key_pem)
    }

    #[test]
    fn produces_a_signed_data_structure() {
        let (cert_pem, key_pem) = test_identity();
        let der = sign_message(b"<loginTicketRequest/>", &cert_pem, &key_pem, None)
            .expect("sign");

        let content_info = ContentInfo::from_der(&der).expect("parse ContentInfo");
        assert_eq!(content_info.content_type, ID_SIGNED_DATA);
    }

    #[test]
    fn base64_variant_round_trips() {
        let (cert_pem, key_pem) = test_identity();
        let b64 = sign_message_base64(b"payload", &cert_pem, &key_pem, None).expect("sign");
        let der = BASE64.decode(b64).expect("valid base64");
        ContentInfo::from_der(&der).expect("parse ContentInfo");
    }

    #[test]
    fn garbage_certificate_is_rejected() {
        let err =
            sign_message(b"payload", "not a certificate", "not a key", None).expect_err("fail");
        assert!(matches!(err, AfipError::Certificate { .. }));
    }
}
