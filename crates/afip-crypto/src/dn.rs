//! # Distinguished Name Model and Validation
//!
//! The six subject fields AFIP requires in onboarding CSRs, with the
//! `serialNumber` convention that binds the certificate to a taxpayer:
//! the literal `CUIT ` followed by exactly 11 digits.
//!
//! Validation is invoked internally by [`DistinguishedName::for_cuit`] and
//! is independently callable so externally supplied DNs (e.g. extracted
//! from a CSR someone else produced) can be checked before use.

use afip_core::AfipError;
use serde::{Deserialize, Serialize};

/// Subject attribute OIDs, dotted form, shared with the CSR read-back.
pub(crate) const OID_COUNTRY: &str = "2.5.4.6";
pub(crate) const OID_STATE: &str = "2.5.4.8";
pub(crate) const OID_LOCALITY: &str = "2.5.4.7";
pub(crate) const OID_ORGANIZATION: &str = "2.5.4.10";
pub(crate) const OID_COMMON_NAME: &str = "2.5.4.3";
pub(crate) const OID_SERIAL_NUMBER: &str = "2.5.4.5";

/// Distinguished Name bound into an onboarding CSR.
///
/// All six fields are required; see [`DistinguishedName::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName {
    /// ISO 3166 country code (`AR` for production use).
    pub country: String,
    /// State or province.
    pub state: String,
    /// Locality (city).
    pub locality: String,
    /// Legal name of the organization.
    pub organization: String,
    /// Common name — conventionally the alias of the web-service consumer.
    pub common_name: String,
    /// `CUIT ` + 11 digits, binding the certificate to a taxpayer.
    pub serial_number: String,
}

impl DistinguishedName {
    /// Assemble a DN for a taxpayer, validating every field.
    ///
    /// Fails with a Validation error naming `cuit` when the identifier is
    /// not exactly 11 digits; the assembled DN is then validated as a
    /// whole before being returned.
    pub fn for_cuit(
        cuit: &str,
        organization: impl Into<String>,
        common_name: impl Into<String>,
        state: impl Into<String>,
        locality: impl Into<String>,
        country: impl Into<String>,
    ) -> Result<Self, AfipError> {
        if !is_cuit_digits(cuit) {
            return Err(AfipError::Validation {
                field: "cuit".into(),
                reason: format!("expected exactly 11 digits, got {cuit:?}"),
            });
        }
        let dn = Self {
            country: country.into(),
            state: state.into(),
            locality: locality.into(),
            organization: organization.into(),
            common_name: common_name.into(),
            serial_number: format!("CUIT {cuit}"),
        };
        dn.validate()?;
        Ok(dn)
    }

    /// Validate the DN structure.
    ///
    /// Fails with a Validation error naming the first empty field, or
    /// `serialNumber` when it does not match `CUIT ` + 11 digits.
    pub fn validate(&self) -> Result<(), AfipError> {
        let required = [
            ("country", &self.country),
            ("state", &self.state),
            ("locality", &self.locality),
            ("organization", &self.organization),
            ("commonName", &self.common_name),
            ("serialNumber", &self.serial_number),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AfipError::Validation {
                    field: name.into(),
                    reason: "required DN field is empty".into(),
                });
            }
        }

        let serial = &self.serial_number;
        let valid = serial
            .strip_prefix("CUIT ")
            .is_some_and(|digits| is_cuit_digits(digits));
        if !valid {
            return Err(AfipError::Validation {
                field: "serialNumber".into(),
                reason: format!("expected `CUIT ` followed by 11 digits, got {serial:?}"),
            });
        }
        Ok(())
    }

    /// The DN fields paired with their subject attribute OIDs, in the
    /// order they are written into a CSR subject.
    pub(crate) fn attributes(&self) -> [(&'static str, &str); 6] {
        [
            (OID_COUNTRY, &self.country),
            (OID_STATE, &self.state),
            (OID_LOCALITY, &self.locality),
            (OID_ORGANIZATION, &self.organization),
            (OID_COMMON_NAME, &self.common_name),
            (OID_SERIAL_NUMBER, &self.serial_number),
        ]
    }
}

fn is_cuit_digits(s: &str) -> bool {
    s.len() == 11 && s.bytes().all(|b| b.is_ascii_digit())
}
