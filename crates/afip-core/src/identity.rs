//! # Domain Identity Newtypes
//!
//! Newtype wrapper for the CUIT (Clave Única de Identificación Tributaria),
//! the 11-digit taxpayer identifier that scopes authentication and every
//! per-account operation against AFIP.
//!
//! The wrapper exists so a taxpayer identifier can never be confused with
//! any other numeric string: constructors validate, and the inner value is
//! only reachable through `as_str()`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AfipError;

/// Argentine taxpayer identifier (CUIT).
///
/// Format: exactly 11 ASCII digits, no separators. The leading two digits
/// encode the taxpayer class (20/23/24/27 for individuals, 30/33/34 for
/// companies) but the SDK does not interpret them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cuit(String);

impl Cuit {
    /// Parse and validate a CUIT from its canonical digit string.
    pub fn new(raw: &str) -> Result<Self, AfipError> {
        let raw = raw.trim();
        if raw.len() != 11 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AfipError::Validation {
                field: "cuit".into(),
                reason: format!("expected exactly 11 digits, got {raw:?}"),
            });
        }
        Ok(Self(raw.to_string()))
    }

    /// The canonical 11-digit representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Cuit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Cuit {
    type Err = AfipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for Cuit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Cuit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}
