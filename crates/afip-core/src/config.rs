//! # Credential Configuration
//!
//! Immutable startup configuration for the SDK: which taxpayer is calling,
//! against which environment, with which certificate material, and where
//! the resource and ticket-cache directories live.
//!
//! ## Invariant
//!
//! A [`Credentials`] value cannot exist with a malformed CUIT or with a
//! certificate/private-key file that is absent at construction time.
//! Downstream code relies on this and never re-checks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AfipError;
use crate::identity::Cuit;

/// Target AFIP environment.
///
/// Production and testing ("homologación") expose the same services on
/// different endpoints and WSDL files, and tickets obtained in one are
/// worthless in the other — the cache key includes the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    /// Live AFIP services.
    Production,
    /// Homologación (test) services.
    Testing,
}

impl Environment {
    /// Whether this is the production environment.
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Suffix appended to ticket-cache file names.
    ///
    /// Production entries carry `-production`; testing entries carry
    /// nothing, matching the `TA-<cuit>-<service>[-production].xml`
    /// convention.
    pub fn cache_suffix(&self) -> &'static str {
        match self {
            Self::Production => "-production",
            Self::Testing => "",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Production => f.write_str("production"),
            Self::Testing => f.write_str("testing"),
        }
    }
}

/// Immutable credential configuration consumed by the ticket manager and
/// the service dispatcher.
#[derive(Debug, Clone)]
pub struct Credentials {
    cuit: Cuit,
    environment: Environment,
    certificate_path: PathBuf,
    private_key_path: PathBuf,
    key_passphrase: Option<String>,
    resources_dir: PathBuf,
    cache_dir: PathBuf,
    custom_wsdl_dir: Option<PathBuf>,
    soap_faults_as_errors: bool,
}

impl Credentials {
    /// Build a credential configuration.
    ///
    /// Fails with a [`AfipError::File`] when the certificate or private-key
    /// file does not exist. The resources directory defaults to
    /// `resources/` and the ticket cache to `cache/`, both relative to the
    /// working directory; override them with the `with_*` methods.
    pub fn new(
        cuit: Cuit,
        environment: Environment,
        certificate_path: impl Into<PathBuf>,
        private_key_path: impl Into<PathBuf>,
    ) -> Result<Self, AfipError> {
        let certificate_path = certificate_path.into();
        let private_key_path = private_key_path.into();
        for path in [&certificate_path, &private_key_path] {
            if !path.is_file() {
                return Err(AfipError::File {
                    path: path.display().to_string(),
                    reason: "file not found".into(),
                });
            }
        }
        Ok(Self {
            cuit,
            environment,
            certificate_path,
            private_key_path,
            key_passphrase: None,
            resources_dir: PathBuf::from("resources"),
            cache_dir: PathBuf::from("cache"),
            custom_wsdl_dir: None,
            soap_faults_as_errors: true,
        })
    }

    /// Passphrase protecting the private key, if any.
    pub fn with_key_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.key_passphrase = Some(passphrase.into());
        self
    }

    /// Directory holding the WSDL files shipped with the SDK.
    pub fn with_resources_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.resources_dir = dir.into();
        self
    }

    /// Directory holding cached authorization tickets.
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Caller-supplied directory searched for WSDL files before the
    /// built-in resources directory.
    pub fn with_custom_wsdl_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.custom_wsdl_dir = Some(dir.into());
        self
    }

    /// Legacy flag controlling whether transport faults raise.
    ///
    /// The SDK surfaces every fault as a typed error regardless; the flag
    /// is stored for construction compatibility with existing configs.
    pub fn with_soap_faults_as_errors(mut self, value: bool) -> Self {
        self.soap_faults_as_errors = value;
        self
    }

    /// The configured taxpayer identifier.
    pub fn cuit(&self) -> &Cuit {
        &self.cuit
    }

    /// The configured target environment.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Path of the X.509 certificate used to sign login envelopes.
    pub fn certificate_path(&self) -> &Path {
        &self.certificate_path
    }

    /// Path of the private key matching the certificate.
    pub fn private_key_path(&self) -> &Path {
        &self.private_key_path
    }

    /// Private-key passphrase, when the key is encrypted.
    pub fn key_passphrase(&self) -> Option<&str> {
        self.key_passphrase.as_deref()
    }

    /// Directory holding built-in WSDL files.
    pub fn resources_dir(&self) -> &Path {
        &self.resources_dir
    }

    /// Directory holding cached authorization tickets.
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Optional caller-supplied WSDL override directory.
    pub fn custom_wsdl_dir(&self) -> Option<&Path> {
        self.custom_wsdl_dir.as_deref()
    }

    /// The stored transport-fault flag. See [`Self::with_soap_faults_as_errors`].
    pub fn soap_faults_as_errors(&self) -> bool {
        self.soap_faults_as_errors
    }
}
