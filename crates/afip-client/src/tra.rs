//! # Login Request Envelope (TRA)
//!
//! The short-lived `loginTicketRequest` document submitted to WSAA: a
//! unique id derived from the clock, a validity window of ±600 seconds
//! around "now", and the target service name. The envelope is written to
//! disk only for the duration of the signing step and never outlives a
//! single authentication attempt.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, SecondsFormat, Utc};

/// Half-width of the envelope validity window, in seconds.
///
/// The same margin drives ticket staleness: it absorbs clock skew between
/// the client and AFIP plus request latency.
pub const VALIDITY_WINDOW_SECS: i64 = 600;

/// A `loginTicketRequest` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRequestEnvelope {
    unique_id: u64,
    generation_time: DateTime<Utc>,
    expiration_time: DateTime<Utc>,
    service: String,
}

impl LoginRequestEnvelope {
    /// Build a fresh envelope for `service`, centered on the current time.
    pub fn new(service: &str) -> Self {
        let now = Utc::now();
        Self {
            unique_id: now.timestamp().unsigned_abs(),
            generation_time: now - Duration::seconds(VALIDITY_WINDOW_SECS),
            expiration_time: now + Duration::seconds(VALIDITY_WINDOW_SECS),
            service: service.to_string(),
        }
    }

    /// The envelope's clock-derived unique id.
    pub fn unique_id(&self) -> u64 {
        self.unique_id
    }

    /// The service this envelope requests a ticket for.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Render the envelope as `loginTicketRequest` XML.
    pub fn to_xml(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <loginTicketRequest version=\"1.0\">\
             <header>\
             <uniqueId>{}</uniqueId>\
             <generationTime>{}</generationTime>\
             <expirationTime>{}</expirationTime>\
             </header>\
             <service>{}</service>\
             </loginTicketRequest>",
            self.unique_id,
            self.generation_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.expiration_time.to_rfc3339_opts(SecondsFormat::Secs, true),
            quick_xml::escape::escape(&self.service),
        )
    }
}

/// A file removed on drop — the envelope and its signed counterpart live
/// on disk only while the signature is being produced and extracted.
#[derive(Debug)]
pub(crate) struct ScopedFile {
    path: PathBuf,
}

impl ScopedFile {
    /// Write `contents` to `path`, deleting the file when the guard drops.
    pub(crate) fn create(path: PathBuf, contents: &[u8]) -> std::io::Result<Self> {
        std::fs::write(&path, contents)?;
        Ok(Self { path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScopedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            // Already gone is fine; anything else is worth a trace.
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), "failed to remove temporary file: {e}");
            }
        }
    }
}
