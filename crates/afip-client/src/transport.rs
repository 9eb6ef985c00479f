//! # SOAP Transport Seam
//!
//! SOAP is an external collaborator: the dispatcher and the ticket manager
//! only speak to the [`SoapClient`] trait, and tests substitute mock
//! implementations. [`HttpSoapClient`] is the shipped collaborator — a
//! blocking HTTP client that renders the flat parameter trees AFIP
//! operations take into a document-style envelope and decodes the response
//! body back into a `Value` tree.
//!
//! ## TLS
//!
//! AFIP's endpoints (WSAA in particular) sit behind certificate chains
//! that fail standard peer verification, and the authority documents the
//! relaxation; bindings therefore carry an `insecure_tls` flag that maps
//! to `danger_accept_invalid_certs`.

use std::path::PathBuf;
use std::time::Duration;

use afip_core::AfipError;
use serde_json::Value;
use thiserror::Error;

use crate::xml::{value_to_xml, xml_to_value};

/// SOAP protocol version a service binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    /// SOAP 1.1 — `text/xml` + `SOAPAction` header.
    Soap11,
    /// SOAP 1.2 — `application/soap+xml` with inline action.
    Soap12,
}

impl std::fmt::Display for SoapVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Soap11 => f.write_str("1.1"),
            Self::Soap12 => f.write_str("1.2"),
        }
    }
}

/// Everything needed to construct a transport client for one service.
#[derive(Debug, Clone)]
pub struct SoapBinding {
    /// Resolved contract-description (WSDL) path.
    pub wsdl: PathBuf,
    /// Endpoint URL the operations are POSTed to.
    pub endpoint: String,
    /// Protocol version.
    pub soap_version: SoapVersion,
    /// Disable TLS peer verification for this endpoint.
    ///
    /// The AFIP endpoints present certificate chains that standard roots
    /// reject, so verification is relaxed where the authority requires it.
    /// The legacy contract also pins a single RC4-SHA cipher; that part is
    /// not carried over — cipher selection stays with the rustls defaults,
    /// which the endpoints accept.
    pub insecure_tls: bool,
    /// Target namespace for operation elements, when the service declares
    /// one.
    pub namespace: Option<String>,
}

/// Transport-level failures, classified before they reach the dispatcher.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The HTTP round-trip itself failed (connect, timeout, status with an
    /// unparseable body).
    #[error("http transport error: {reason}")]
    Http {
        /// Diagnostic detail.
        reason: String,
    },

    /// The remote side answered with a SOAP fault.
    #[error("soap fault [{code}]: {message}")]
    Fault {
        /// Fault code as reported by the remote side.
        code: String,
        /// Fault message as reported by the remote side.
        message: String,
    },

    /// The response decoded but its shape is not a SOAP envelope.
    #[error("invalid soap response: {reason}")]
    InvalidResponse {
        /// Diagnostic detail.
        reason: String,
    },
}

/// A constructed transport client for one service binding.
pub trait SoapClient {
    /// Invoke `operation` with a parameter tree and return the decoded
    /// response element content.
    fn call(&self, operation: &str, params: &Value) -> Result<Value, TransportError>;
}

/// Builds transport clients from resolved bindings.
///
/// The dispatcher holds a factory rather than a client so construction
/// can stay lazy — the client exists only once the first operation runs.
pub trait SoapClientFactory {
    /// Construct a client bound to `binding`.
    fn create(&self, binding: &SoapBinding) -> Result<Box<dyn SoapClient>, AfipError>;
}

/// Default factory producing [`HttpSoapClient`] instances.
#[derive(Debug, Default)]
pub struct HttpClientFactory;

impl SoapClientFactory for HttpClientFactory {
    fn create(&self, binding: &SoapBinding) -> Result<Box<dyn SoapClient>, AfipError> {
        Ok(Box::new(HttpSoapClient::new(binding.clone())?))
    }
}

/// Blocking HTTP SOAP client.
pub struct HttpSoapClient {
    http: reqwest::blocking::Client,
    binding: SoapBinding,
}

/// Per-request timeout. No retry policy lives here — callers own retries.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

impl HttpSoapClient {
    /// Build a client for one binding.
    pub fn new(binding: SoapBinding) -> Result<Self, AfipError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(binding.insecure_tls)
            .build()
            .map_err(|e| AfipError::WebService {
                context: binding.endpoint.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self { http, binding })
    }

    fn envelope(&self, operation: &str, params: &Value) -> String {
        let mut body = String::new();
        value_to_xml("__op__", params, &mut body);
        // value_to_xml wraps the tree in a placeholder element; splice the
        // real operation element (with its namespace) around the children.
        let inner = body
            .strip_prefix("<__op__>")
            .and_then(|s| s.strip_suffix("</__op__>"))
            .unwrap_or("");
        let ns_attr = match &self.binding.namespace {
            Some(ns) => format!(" xmlns=\"{ns}\""),
            None => String::new(),
        };
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <soapenv:Envelope xmlns:soapenv=\"{}\">\
             <soapenv:Body><{operation}{ns_attr}>{inner}</{operation}></soapenv:Body>\
             </soapenv:Envelope>",
            match self.binding.soap_version {
                SoapVersion::Soap11 => "http://schemas.xmlsoap.org/soap/envelope/",
                SoapVersion::Soap12 => "http://www.w3.org/2003/05/soap-envelope",
            }
        )
    }

    fn soap_action(&self, operation: &str) -> String {
        match &self.binding.namespace {
            Some(ns) if ns.ends_with('/') => format!("{ns}{operation}"),
            Some(ns) => format!("{ns}/{operation}"),
            None => operation.to_string(),
        }
    }
}

impl SoapClient for HttpSoapClient {
    fn call(&self, operation: &str, params: &Value) -> Result<Value, TransportError> {
        let envelope = self.envelope(operation, params);
        tracing::debug!(
            operation,
            endpoint = %self.binding.endpoint,
            soap_version = %self.binding.soap_version,
            "dispatching soap request"
        );

        let request = match self.binding.soap_version {
            SoapVersion::Soap11 => self
                .http
                .post(&self.binding.endpoint)
                .header(reqwest::header::CONTENT_TYPE, "text/xml; charset=utf-8")
                .header("SOAPAction", format!("\"{}\"", self.soap_action(operation))),
            SoapVersion::Soap12 => self.http.post(&self.binding.endpoint).header(
                reqwest::header::CONTENT_TYPE,
                format!(
                    "application/soap+xml; charset=utf-8; action=\"{}\"",
                    self.soap_action(operation)
                ),
            ),
        };

        let response = request
            .body(envelope)
            .send()
            .map_err(|e| TransportError::Http {
                reason: format!("{operation}: {e}"),
            })?;
        let status = response.status();
        let text = response.text().map_err(|e| TransportError::Http {
            reason: format!("{operation}: reading response body: {e}"),
        })?;

        // Faults arrive as HTTP 500 with a fault envelope; decode the body
        // before deciding the round-trip failed.
        let decoded = match xml_to_value(&text) {
            Ok(value) => value,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Http {
                    reason: format!("{operation}: HTTP {status}"),
                });
            }
            Err(e) => {
                return Err(TransportError::InvalidResponse {
                    reason: format!("{operation}: {e}"),
                });
            }
        };

        extract_body_payload(decoded)
    }
}

/// Pull the response element content out of a decoded SOAP envelope,
/// classifying fault envelopes.
fn extract_body_payload(envelope: Value) -> Result<Value, TransportError> {
    let body = envelope
        .get("Envelope")
        .and_then(|e| e.get("Body"))
        .ok_or_else(|| TransportError::InvalidResponse {
            reason: "response has no soap Body".into(),
        })?;

    if let Some(fault) = body.get("Fault") {
        return Err(fault_from_value(fault));
    }

    match body {
        Value::Object(children) => {
            let mut iter = children.values();
            match (iter.next(), iter.next()) {
                (Some(payload), None) => Ok(payload.clone()),
                _ => Ok(body.clone()),
            }
        }
        other => Ok(other.clone()),
    }
}

fn fault_from_value(fault: &Value) -> TransportError {
    // SOAP 1.1 faultcode/faultstring, SOAP 1.2 Code/Value + Reason/Text.
    let code = fault
        .get("faultcode")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            fault
                .get("Code")
                .and_then(|c| c.get("Value"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown".into());
    let message = fault
        .get("faultstring")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            fault
                .get("Reason")
                .and_then(|r| r.get("Text"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| "unknown fault".into());
    TransportError::Fault { code, message }
}
