//! # Authorization Tickets
//!
//! The time-boxed credential WSAA hands back after a successful login:
//! an opaque token plus a cryptographic signature, valid for roughly
//! twelve hours. [`Ticket`] is the lifecycle-aware form owned by the
//! ticket manager; callers of the dispatch layer only ever see the
//! immutable [`TokenAuthorization`] carrier.

use afip_core::AfipError;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::xml::xml_to_value;

/// A parsed WSAA authorization ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    token: String,
    sign: String,
    generation_time: DateTime<Utc>,
    expiration_time: DateTime<Utc>,
}

impl Ticket {
    /// Parse a ticket from the `loginTicketResponse` XML payload.
    pub fn from_login_response(xml: &str) -> Result<Self, AfipError> {
        let value = xml_to_value(xml)?;
        let response = value
            .get("loginTicketResponse")
            .ok_or_else(|| malformed("missing loginTicketResponse root"))?;

        let token = text_at(response, &["credentials", "token"])?;
        let sign = text_at(response, &["credentials", "sign"])?;
        let generation_time = time_at(response, &["header", "generationTime"])?;
        let expiration_time = time_at(response, &["header", "expirationTime"])?;

        Ok(Self {
            token,
            sign,
            generation_time,
            expiration_time,
        })
    }

    /// The opaque access token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The cryptographic signature paired with the token.
    pub fn sign(&self) -> &str {
        &self.sign
    }

    /// When WSAA generated the ticket.
    pub fn generation_time(&self) -> DateTime<Utc> {
        self.generation_time
    }

    /// When the ticket stops being valid.
    pub fn expiration_time(&self) -> DateTime<Utc> {
        self.expiration_time
    }

    /// Whether `now + margin` has reached the expiration time.
    pub fn is_expired(&self, margin_seconds: i64) -> bool {
        let now = Utc::now();
        now + chrono::Duration::seconds(margin_seconds) >= self.expiration_time
    }

    /// The read-only credential pair handed to dispatch callers.
    pub fn authorization(&self) -> TokenAuthorization {
        TokenAuthorization {
            token: self.token.clone(),
            sign: self.sign.clone(),
        }
    }
}

/// Immutable (token, signature) credential pair.
///
/// Value equality; no expiration awareness — lifecycle is the ticket
/// manager's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenAuthorization {
    token: String,
    sign: String,
}

impl TokenAuthorization {
    /// The opaque access token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The cryptographic signature paired with the token.
    pub fn sign(&self) -> &str {
        &self.sign
    }
}

fn text_at(value: &Value, path: &[&str]) -> Result<String, AfipError> {
    let mut current = value;
    for key in path {
        current = current
            .get(key)
            .ok_or_else(|| malformed(&format!("missing element {}", path.join("/"))))?;
    }
    match current {
        Value::String(s) if !s.is_empty() => Ok(s.clone()),
        _ => Err(malformed(&format!("element {} is empty", path.join("/")))),
    }
}

fn time_at(value: &Value, path: &[&str]) -> Result<DateTime<Utc>, AfipError> {
    let text = text_at(value, path)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| malformed(&format!("bad timestamp {text:?} at {}: {e}", path.join("/"))))
}

fn malformed(reason: &str) -> AfipError {
    AfipError::WebService {
        context: "loginTicketResponse".into(),
        reason: reason.to_string(),
    }
}
