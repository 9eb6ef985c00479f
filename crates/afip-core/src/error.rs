//! # Error Types — Structured Error Taxonomy
//!
//! Defines the one error type surfaced by every crate in the workspace.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Every variant carries enough structured context (field name, service
//!   name, operation name, path) to be logged or inspected programmatically
//!   without parsing the message string.
//! - Nothing is recovered locally except ticket-cache misses; every other
//!   failure propagates unchanged to the caller.
//! - Authentication failures name the stage that failed so a signing
//!   problem is distinguishable from a login round-trip problem.

use thiserror::Error;

/// The stage of the WSAA authentication flow where a failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    /// CMS signing of the login request envelope failed.
    Signing,
    /// The login round-trip to the authentication endpoint failed.
    LoginCall,
    /// The authentication endpoint answered with a payload the SDK could
    /// not decode as a login ticket response.
    MalformedResponse,
    /// Renewal produced a ticket that is already inside the expiration
    /// safety margin; renewal is attempted at most once per call.
    TicketExpired,
}

impl std::fmt::Display for AuthStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signing => f.write_str("tra-signing"),
            Self::LoginCall => f.write_str("login-call"),
            Self::MalformedResponse => f.write_str("malformed-response"),
            Self::TicketExpired => f.write_str("ticket-expired"),
        }
    }
}

/// Top-level error type for the AFIP SDK.
#[derive(Error, Debug)]
pub enum AfipError {
    /// Missing or invalid setup field, or an unresolvable contract
    /// description (WSDL).
    #[error("configuration error: {field}: {reason}")]
    Config {
        /// The configuration field or resource that is missing or invalid.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Malformed DN field, CUIT, or key-size parameter.
    #[error("validation error: {field}: {reason}")]
    Validation {
        /// The exact input field that failed validation.
        field: String,
        /// Why it was rejected, including the offending value.
        reason: String,
    },

    /// Missing, unreadable, or unwritable certificate, key, or cache file.
    #[error("file error: {path}: {reason}")]
    File {
        /// Path of the file involved.
        path: String,
        /// The underlying filesystem failure.
        reason: String,
    },

    /// Ticket acquisition failed: signing, login round-trip, response
    /// decoding, or an expired ticket with no renewal path left.
    #[error("authentication error for service {service} at stage {stage}: {reason}")]
    Authentication {
        /// The logical service the ticket was requested for.
        service: String,
        /// Which step of the flow failed.
        stage: AuthStage,
        /// Diagnostic detail.
        reason: String,
    },

    /// Remote-side SOAP fault surfaced from a service call.
    #[error("soap fault in {operation}: [{code}] {message}")]
    SoapFault {
        /// The remote operation that faulted.
        operation: String,
        /// Fault code as reported by the remote side.
        code: String,
        /// Fault message as reported by the remote side.
        message: String,
    },

    /// CSR or certificate parse/generation failure.
    #[error("certificate error: {reason}")]
    Certificate {
        /// What could not be parsed or produced.
        reason: String,
    },

    /// Structurally invalid registration or malformed response shape.
    #[error("web service error in {context}: {reason}")]
    WebService {
        /// The registration field or operation involved.
        context: String,
        /// Diagnostic detail.
        reason: String,
    },
}

impl AfipError {
    /// Shorthand for a [`AfipError::File`] built from an `io::Error`.
    pub fn file(path: impl std::fmt::Display, err: &std::io::Error) -> Self {
        Self::File {
            path: path.to_string(),
            reason: err.to_string(),
        }
    }
}
