//! # afip-client — WSAA Authorization and Web-Service Dispatch
//!
//! The runtime half of the SDK: obtains and caches WSAA authorization
//! tickets, and dispatches operations against any registered AFIP web
//! service through a pluggable SOAP transport.
//!
//! ## Architecture
//!
//! - [`wsaa::TicketManager`] — the ticket lifecycle: cache lookup, expiry
//!   check with safety margin, CMS-signed login, write-back.
//! - [`dispatch::ServiceDispatcher`] — one dispatcher per (credentials,
//!   service) pair; resolves the WSDL, lazily builds one transport
//!   client, and classifies faults into the typed error taxonomy.
//! - [`registry::ServiceRegistry`] — data-driven catalogue of service
//!   registrations (WSDL names, endpoints, SOAP version, namespace).
//! - [`transport::SoapClient`] — the seam behind which the actual SOAP
//!   stack lives; tests substitute mocks here.
//!
//! ## Security Invariant
//!
//! - A ticket within [`wsaa::TICKET_SAFETY_MARGIN_SECS`] of expiry is
//!   treated as expired and never presented to a business service.
//! - Login request envelopes are valid for at most ±600 seconds around
//!   generation time; the CMS signature covers exactly that envelope.

pub mod cache;
pub mod dispatch;
pub mod registry;
pub mod ticket;
pub mod tra;
pub mod transport;
pub mod wsaa;
pub mod xml;

pub use cache::TicketCache;
pub use dispatch::ServiceDispatcher;
pub use registry::{ServiceRegistration, ServiceRegistry};
pub use ticket::{Ticket, TokenAuthorization};
pub use tra::LoginRequestEnvelope;
pub use transport::{SoapBinding, SoapClient, SoapClientFactory, SoapVersion, TransportError};
pub use wsaa::{TicketManager, TICKET_SAFETY_MARGIN_SECS};
pub use xml::{value_to_xml, xml_to_value};
