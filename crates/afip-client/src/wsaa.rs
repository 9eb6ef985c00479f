//! # WSAA Ticket Lifecycle Manager
//!
//! Guarantees that every outbound service call carries a valid,
//! non-expired authorization ticket while minimizing login round-trips —
//! WSAA rate-limits login attempts, so a cached ticket is always preferred.
//!
//! ## State machine per (taxpayer, service, environment)
//!
//! - **Absent**: no cache entry → renew.
//! - **Cached-Valid**: entry expires more than 600 s from now → return it,
//!   zero network calls.
//! - **Cached-Expired**: entry inside the 600 s margin → renew.
//! - **Renewing**: build envelope → CMS-sign → `loginCms` round-trip →
//!   persist → return. Renewal runs at most once per `get_ticket` call; a
//!   renewed ticket that is still expired is an Authentication error, not
//!   another attempt.

use afip_core::{AfipError, AuthStage, Credentials};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};

use crate::cache::TicketCache;
use crate::ticket::{Ticket, TokenAuthorization};
use crate::tra::{LoginRequestEnvelope, ScopedFile, VALIDITY_WINDOW_SECS};
use crate::transport::{
    HttpClientFactory, SoapBinding, SoapClient, SoapClientFactory, SoapVersion, TransportError,
};

/// Seconds before nominal expiration at which a ticket counts as stale.
///
/// Absorbs clock skew and request latency so a ticket is never used to
/// authorize a call that arrives after it has technically expired.
pub const TICKET_SAFETY_MARGIN_SECS: i64 = VALIDITY_WINDOW_SECS;

const WSAA_ENDPOINT_PRODUCTION: &str = "https://wsaa.afip.gov.ar/ws/services/LoginCms";
const WSAA_ENDPOINT_TESTING: &str = "https://wsaahomo.afip.gov.ar/ws/services/LoginCms";
const WSAA_NAMESPACE: &str = "http://wsaa.view.sua.dvadac.desein.afip.gov";
const WSAA_WSDL: &str = "wsaa.wsdl";

/// Owns the authorization tickets for one credential configuration.
pub struct TicketManager {
    credentials: Credentials,
    cache: TicketCache,
    factory: Box<dyn SoapClientFactory>,
    client: Option<Box<dyn SoapClient>>,
}

impl TicketManager {
    /// Manager using the default HTTP transport against the WSAA endpoint
    /// for the configured environment.
    pub fn new(credentials: Credentials) -> Self {
        Self::with_factory(credentials, Box::new(HttpClientFactory))
    }

    /// Manager with a caller-supplied transport factory (tests inject
    /// mocks here).
    pub fn with_factory(credentials: Credentials, factory: Box<dyn SoapClientFactory>) -> Self {
        let cache = TicketCache::new(credentials.cache_dir());
        Self {
            credentials,
            cache,
            factory,
            client: None,
        }
    }

    /// The credential configuration this manager authenticates.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Return a valid ticket for `service`, renewing at most once.
    pub fn get_ticket(&mut self, service: &str) -> Result<Ticket, AfipError> {
        let cuit = self.credentials.cuit().clone();
        let environment = self.credentials.environment();

        if let Some(payload) = self.cache.load(&cuit, service, environment)? {
            match Ticket::from_login_response(&payload) {
                Ok(ticket) if !ticket.is_expired(TICKET_SAFETY_MARGIN_SECS) => {
                    tracing::debug!(service, %cuit, "ticket cache hit");
                    return Ok(ticket);
                }
                Ok(_) => {
                    tracing::info!(service, %cuit, "cached ticket expired, renewing");
                }
                Err(e) => {
                    tracing::warn!(service, %cuit, "cached ticket unreadable, renewing: {e}");
                }
            }
        } else {
            tracing::info!(service, %cuit, "no cached ticket, renewing");
        }

        let ticket = self.renew(service)?;
        if ticket.is_expired(TICKET_SAFETY_MARGIN_SECS) {
            return Err(AfipError::Authentication {
                service: service.into(),
                stage: AuthStage::TicketExpired,
                reason: format!(
                    "renewed ticket already expires at {}; renewal is attempted at most once",
                    ticket.expiration_time()
                ),
            });
        }
        Ok(ticket)
    }

    /// The (token, sign) pair for `service`, renewing the ticket when
    /// needed.
    pub fn authorization(&mut self, service: &str) -> Result<TokenAuthorization, AfipError> {
        Ok(self.get_ticket(service)?.authorization())
    }

    /// One full authentication round-trip: sign a fresh envelope, submit
    /// it, parse and persist the returned ticket.
    fn renew(&mut self, service: &str) -> Result<Ticket, AfipError> {
        let envelope = LoginRequestEnvelope::new(service);
        let tra_xml = envelope.to_xml();

        let signing_err = |reason: String| AfipError::Authentication {
            service: service.into(),
            stage: AuthStage::Signing,
            reason,
        };

        // The envelope and its signed counterpart are disk-backed only for
        // the duration of this attempt; the guards remove them on every
        // exit path.
        std::fs::create_dir_all(self.credentials.cache_dir())
            .map_err(|e| signing_err(format!("cannot create cache dir: {e}")))?;
        let tra_file = ScopedFile::create(
            self.credentials.cache_dir().join(format!("TRA-{service}.xml")),
            tra_xml.as_bytes(),
        )
        .map_err(|e| signing_err(format!("cannot write login envelope: {e}")))?;
        tracing::debug!(envelope = %tra_file.path().display(), "login envelope staged");

        let cert_pem = std::fs::read_to_string(self.credentials.certificate_path())
            .map_err(|e| signing_err(format!("cannot read certificate: {e}")))?;
        let key_pem = std::fs::read_to_string(self.credentials.private_key_path())
            .map_err(|e| signing_err(format!("cannot read private key: {e}")))?;

        let cms_der = afip_crypto::sign_message(
            tra_xml.as_bytes(),
            &cert_pem,
            &key_pem,
            self.credentials.key_passphrase(),
        )
        .map_err(|e| signing_err(e.to_string()))?;
        let _cms_file = ScopedFile::create(
            self.credentials.cache_dir().join(format!("TRA-{service}.cms")),
            &cms_der,
        )
        .map_err(|e| signing_err(format!("cannot write signed envelope: {e}")))?;
        let cms_b64 = BASE64.encode(&cms_der);

        tracing::info!(service, environment = %self.credentials.environment(), "submitting loginCms");
        let response = self
            .login_client()?
            .call("loginCms", &json!({ "in0": cms_b64 }))
            .map_err(|e| match e {
                TransportError::InvalidResponse { reason } => AfipError::Authentication {
                    service: service.into(),
                    stage: AuthStage::MalformedResponse,
                    reason,
                },
                other => AfipError::Authentication {
                    service: service.into(),
                    stage: AuthStage::LoginCall,
                    reason: other.to_string(),
                },
            })?;

        let ticket_xml = login_return(&response).ok_or_else(|| AfipError::Authentication {
            service: service.into(),
            stage: AuthStage::MalformedResponse,
            reason: "response carries no loginCmsReturn payload".into(),
        })?;
        let ticket =
            Ticket::from_login_response(&ticket_xml).map_err(|e| AfipError::Authentication {
                service: service.into(),
                stage: AuthStage::MalformedResponse,
                reason: e.to_string(),
            })?;

        self.cache.store(
            self.credentials.cuit(),
            service,
            self.credentials.environment(),
            &ticket_xml,
        )?;
        tracing::info!(service, expires = %ticket.expiration_time(), "ticket renewed");
        Ok(ticket)
    }

    fn login_client(&mut self) -> Result<&dyn SoapClient, AfipError> {
        let client = match &mut self.client {
            Some(client) => client,
            vacant => {
                let endpoint = match self.credentials.environment() {
                    afip_core::Environment::Production => WSAA_ENDPOINT_PRODUCTION,
                    afip_core::Environment::Testing => WSAA_ENDPOINT_TESTING,
                };
                let binding = SoapBinding {
                    wsdl: self.credentials.resources_dir().join(WSAA_WSDL),
                    endpoint: endpoint.into(),
                    soap_version: SoapVersion::Soap11,
                    insecure_tls: true,
                    namespace: Some(WSAA_NAMESPACE.into()),
                };
                vacant.insert(self.factory.create(&binding)?)
            }
        };
        Ok(&**client)
    }
}

/// The `loginCms` response is either the bare ticket XML or an object
/// wrapping it in `loginCmsReturn`.
fn login_return(response: &Value) -> Option<String> {
    match response {
        Value::String(xml) => Some(xml.clone()),
        Value::Object(_) => response
            .get("loginCmsReturn")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afip_core::{Cuit, Environment};
    use chrono::Utc;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::ticket::tests::response_xml;

    /// Mock transport that counts invocations and replays a canned reply.
    struct MockClient {
        calls: Rc<RefCell<u32>>,
        reply: Result<Value, String>,
    }

    impl SoapClient for MockClient {
        fn call(&self, _operation: &str, _params: &Value) -> Result<Value, TransportError> {
            *self.calls.borrow_mut() += 1;
            match &self.reply {
                Ok(value) => Ok(value.clone()),
                Err(reason) => Err(TransportError::Http {
                    reason: reason.clone(),
                }),
            }
        }
    }

    struct MockFactory {
        calls: Rc<RefCell<u32>>,
        reply: Result<Value, String>,
    }

    impl SoapClientFactory for MockFactory {
        fn create(&self, _binding: &SoapBinding) -> Result<Box<dyn SoapClient>, AfipError> {
            Ok(Box::new(MockClient {
                calls: self.calls.clone(),
                reply: self.reply.clone(),
            }))
        }
    }

    struct Fixture {
        manager: TicketManager,
        calls: Rc<RefCell<u32>>,
        cache: TicketCache,
        _dir: tempfile::TempDir,
    }

    /// Credentials over a real self-signed certificate + key on disk, and
    /// a mock login transport answering with `reply`.
    fn fixture(reply: Result<Value, String>) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let (cert_pem, key_pem) = test_identity();
        let cert_path = dir.path().join("cert.pem");
        let key_path = dir.path().join("key.pem");
        std::fs::write(&cert_path, cert_pem).expect("write cert");
        std::fs::write(&key_path, key_pem).expect("write key");

        let credentials = Credentials::new(
            Cuit::new("20294192345").expect("cuit"),
            Environment::Testing,
            &cert_path,
            &key_path,
        )
        .expect("credentials")
        .with_cache_dir(dir.path().join("cache"));

        let calls = Rc::new(RefCell::new(0));
        let cache = TicketCache::new(credentials.cache_dir());
        let manager = TicketManager::with_factory(
            credentials,
            Box::new(MockFactory {
                calls: calls.clone(),
                reply,
            }),
        );
        Fixture {
            manager,
            calls,
            cache,
            _dir: dir,
        }
    }

    fn test_identity() -> (String, String) {
        use der::EncodePem;
        use pkcs8::LineEnding;
        use rsa::pkcs1v15::SigningKey;
        use rsa::pkcs8::EncodePublicKey;
        use sha2::Sha256;
        use std::str::FromStr;
        use std::time::Duration;
        use x509_cert::builder::{Builder, CertificateBuilder, Profile};
        use x509_cert::name::Name;
        use x509_cert::serial_number::SerialNumber;
        use x509_cert::spki::SubjectPublicKeyInfoOwned;
        use x509_cert::time::Validity;

        let key_pem = afip_crypto::generate_key_pair(2048, None).expect("key");
        let key = afip_crypto::load_private_key(&key_pem, None).expect("load");
        let signer = SigningKey::<Sha256>::new(key.clone());
        let spki_der = key
            .to_public_key()
            .to_public_key_der()
            .expect("public key der");
        let spki = SubjectPublicKeyInfoOwned::try_from(spki_der.as_bytes()).expect("spki");
        let builder = CertificateBuilder::new(
            Profile::Root,
            SerialNumber::from(7u32),
            Validity::from_now(Duration::from_secs(3600)).expect("validity"),
            Name::from_str("CN=acme-ws,O=Acme,C=AR").expect("subject"),
            spki,
            &signer,
        )
        .expect("builder");
        let certificate = builder
            .build::<rsa::pkcs1v15::Signature>()
            .expect("certificate");
        (
            certificate.to_pem(LineEnding::LF).expect("cert pem"),
            key_pem,
        )
    }

    fn login_reply(expiration: chrono::DateTime<Utc>) -> Value {
        json!({ "loginCmsReturn": response_xml(expiration) })
    }

    #[test]
    fn cached_valid_ticket_makes_no_network_call() {
        let fx = fixture(Ok(login_reply(Utc::now() + chrono::Duration::hours(12))));
        let mut manager = fx.manager;

        // Seed the cache with a ticket valid for well over the margin.
        fx.cache
            .store(
                &Cuit::new("20294192345").expect("cuit"),
                "wsfe",
                Environment::Testing,
                &response_xml(Utc::now() + chrono::Duration::hours(6)),
            )
            .expect("seed cache");

        let ticket = manager.get_ticket("wsfe").expect("ticket");
        assert_eq!(ticket.token(), "tok-123");
        assert_eq!(*fx.calls.borrow(), 0, "cache hit must not touch the network");
    }

    #[test]
    fn absent_ticket_triggers_exactly_one_renewal() {
        let fx = fixture(Ok(login_reply(Utc::now() + chrono::Duration::hours(12))));
        let mut manager = fx.manager;

        let ticket = manager.get_ticket("wsfe").expect("ticket");
        assert_eq!(ticket.token(), "tok-123");
        assert_eq!(*fx.calls.borrow(), 1);

        // The renewed ticket is persisted and served from cache afterwards.
        let again = manager.get_ticket("wsfe").expect("ticket");
        assert_eq!(again, ticket);
        assert_eq!(*fx.calls.borrow(), 1, "second call must hit the cache");
    }

    #[test]
    fn expired_cache_entry_triggers_renewal() {
        let fx = fixture(Ok(login_reply(Utc::now() + chrono::Duration::hours(12))));
        let mut manager = fx.manager;

        fx.cache
            .store(
                &Cuit::new("20294192345").expect("cuit"),
                "wsfe",
                Environment::Testing,
                // Inside the 600 s margin.
                &response_xml(Utc::now() + chrono::Duration::seconds(120)),
            )
            .expect("seed cache");

        manager.get_ticket("wsfe").expect("ticket");
        assert_eq!(*fx.calls.borrow(), 1, "stale entry must renew once");
    }

    #[test]
    fn renewal_yielding_expired_ticket_fails_without_looping() {
        // The mock always answers with an already-stale ticket.
        let fx = fixture(Ok(login_reply(Utc::now() + chrono::Duration::seconds(60))));
        let mut manager = fx.manager;

        let err = manager.get_ticket("wsfe").expect_err("must fail");
        assert!(matches!(
            err,
            AfipError::Authentication {
                stage: AuthStage::TicketExpired,
                ..
            }
        ));
        assert_eq!(*fx.calls.borrow(), 1, "renewal must run exactly once");
    }

    #[test]
    fn login_round_trip_failure_names_service_and_stage() {
        let fx = fixture(Err("connection refused".into()));
        let mut manager = fx.manager;

        let err = manager.get_ticket("wsfe").expect_err("must fail");
        match err {
            AfipError::Authentication {
                service,
                stage: AuthStage::LoginCall,
                ..
            } => assert_eq!(service, "wsfe"),
            other => panic!("expected login-call failure, got {other}"),
        }
    }

    #[test]
    fn malformed_login_response_is_an_authentication_error() {
        let fx = fixture(Ok(json!({ "loginCmsReturn": "<not-a-ticket/>" })));
        let mut manager = fx.manager;

        let err = manager.get_ticket("wsfe").expect_err("must fail");
        assert!(matches!(
            err,
            AfipError::Authentication {
                stage: AuthStage::MalformedResponse,
                ..
            }
        ));
    }

    #[test]
    fn temporary_envelope_files_are_cleaned_up() {
        let fx = fixture(Ok(login_reply(Utc::now() + chrono::Duration::hours(12))));
        let cache_dir = fx.manager.credentials().cache_dir().to_path_buf();
        let mut manager = fx.manager;

        manager.get_ticket("wsfe").expect("ticket");
        let leftovers: Vec<String> = std::fs::read_dir(&cache_dir)
            .expect("read cache dir")
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("TRA-"))
            .collect();
        assert!(leftovers.is_empty(), "stray files: {leftovers:?}");
    }
}
