//! # Web-Service Dispatcher
//!
//! Resolves the contract description and endpoint for one registered
//! service, executes remote operations through the transport seam, and
//! classifies transport-level faults into the typed error taxonomy.
//! Results are returned untouched — business-level validation belongs to
//! callers.

use std::path::PathBuf;

use afip_core::{AfipError, Credentials};
use serde_json::{json, Value};

use crate::registry::{ServiceRegistration, ServiceRegistry};
use crate::ticket::TokenAuthorization;
use crate::transport::{HttpClientFactory, SoapBinding, SoapClient, SoapClientFactory};
use crate::wsaa::TicketManager;

/// Dispatcher for one (credentials, service registration) pair.
///
/// Owns exactly one transport client, constructed lazily on the first
/// [`execute`](Self::execute) call, and one ticket manager for the
/// registration's service key.
pub struct ServiceDispatcher {
    credentials: Credentials,
    registration: ServiceRegistration,
    wsdl: PathBuf,
    tickets: TicketManager,
    factory: Box<dyn SoapClientFactory>,
    client: Option<Box<dyn SoapClient>>,
}

impl ServiceDispatcher {
    /// Dispatcher over the default HTTP transport.
    pub fn new(
        credentials: Credentials,
        registration: ServiceRegistration,
    ) -> Result<Self, AfipError> {
        Self::with_factories(
            credentials,
            registration,
            Box::new(HttpClientFactory),
            Box::new(HttpClientFactory),
        )
    }

    /// Dispatcher resolved from the registry by service name.
    ///
    /// This is the one lookup path for pre-registered services; unknown
    /// names fail with a Configuration error from the registry.
    pub fn for_service(
        credentials: Credentials,
        registry: &ServiceRegistry,
        service: &str,
    ) -> Result<Self, AfipError> {
        let registration = registry.get(service)?.clone();
        Self::new(credentials, registration)
    }

    /// Dispatcher with caller-supplied transport factories — one for the
    /// service calls, one for the WSAA login (tests inject mocks here).
    pub fn with_factories(
        credentials: Credentials,
        registration: ServiceRegistration,
        service_factory: Box<dyn SoapClientFactory>,
        login_factory: Box<dyn SoapClientFactory>,
    ) -> Result<Self, AfipError> {
        let wsdl = resolve_wsdl(&credentials, &registration)?;
        let tickets = TicketManager::with_factory(credentials.clone(), login_factory);
        Ok(Self {
            credentials,
            registration,
            wsdl,
            tickets,
            factory: service_factory,
            client: None,
        })
    }

    /// The credential configuration this dispatcher calls with.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// The registration this dispatcher is bound to.
    pub fn registration(&self) -> &ServiceRegistration {
        &self.registration
    }

    /// The resolved contract-description path.
    pub fn wsdl_path(&self) -> &std::path::Path {
        &self.wsdl
    }

    /// Invoke a remote operation with a parameter tree.
    ///
    /// Fault-marked results fail with [`AfipError::SoapFault`] carrying
    /// the fault code, message, and operation name; anything else is
    /// returned raw.
    pub fn execute(&mut self, operation: &str, params: &Value) -> Result<Value, AfipError> {
        tracing::debug!(
            operation,
            service = %self.registration.service,
            "executing remote operation"
        );
        let result = self.transport()?.call(operation, params).map_err(|e| match e {
            crate::transport::TransportError::Fault { code, message } => AfipError::SoapFault {
                operation: operation.into(),
                code,
                message,
            },
            other => AfipError::WebService {
                context: operation.into(),
                reason: other.to_string(),
            },
        })?;

        // Some transports hand fault-shaped payloads back as results
        // instead of classifying them; inspect before returning.
        if let Some((code, message)) = fault_marker(&result) {
            return Err(AfipError::SoapFault {
                operation: operation.into(),
                code,
                message,
            });
        }
        Ok(result)
    }

    /// A valid authorization ticket for this service, from cache or via a
    /// WSAA round-trip.
    pub fn authorization_ticket(&mut self) -> Result<TokenAuthorization, AfipError> {
        let service = self.registration.service.clone();
        self.tickets.authorization(&service)
    }

    /// The transport client, built on first use and reused afterwards.
    fn transport(&mut self) -> Result<&dyn SoapClient, AfipError> {
        let client = match &mut self.client {
            Some(client) => client,
            vacant => {
                let binding = SoapBinding {
                    wsdl: self.wsdl.clone(),
                    endpoint: self
                        .registration
                        .endpoint_for(self.credentials.environment())
                        .to_string(),
                    soap_version: self.registration.soap_version,
                    insecure_tls: true,
                    namespace: self.registration.namespace.clone(),
                };
                vacant.insert(self.factory.create(&binding)?)
            }
        };
        Ok(&**client)
    }

    /// The `Auth` parameter block (token, sign, CUIT) every AFIP business
    /// operation embeds.
    pub fn auth_params(&mut self) -> Result<Value, AfipError> {
        let authorization = self.authorization_ticket()?;
        Ok(json!({
            "Auth": {
                "Token": authorization.token(),
                "Sign": authorization.sign(),
                "Cuit": self.credentials.cuit().as_str(),
            }
        }))
    }
}

/// Locate the environment's WSDL: the caller-overridable custom directory
/// first, then the built-in resources directory.
fn resolve_wsdl(
    credentials: &Credentials,
    registration: &ServiceRegistration,
) -> Result<PathBuf, AfipError> {
    let file_name = registration.wsdl_for(credentials.environment());
    let mut searched = Vec::new();
    for dir in [
        credentials.custom_wsdl_dir(),
        Some(credentials.resources_dir()),
    ]
    .into_iter()
    .flatten()
    {
        let candidate = dir.join(file_name);
        if candidate.is_file() {
            return Ok(candidate);
        }
        searched.push(candidate.display().to_string());
    }
    Err(AfipError::Config {
        field: "wsdl".into(),
        reason: format!(
            "contract description {file_name:?} for service {:?} not found (searched {})",
            registration.service,
            searched.join(", ")
        ),
    })
}

/// Fault markers some transports leave in result payloads
/// (`faultcode`/`faultstring` pairs) instead of raising.
fn fault_marker(result: &Value) -> Option<(String, String)> {
    let code = result.get("faultcode").and_then(Value::as_str)?;
    let message = result
        .get("faultstring")
        .and_then(Value::as_str)
        .unwrap_or("unknown fault");
    Some((code.to_string(), message.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use afip_core::{Cuit, Environment};
    use crate::transport::TransportError;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct CannedClient {
        calls: Rc<RefCell<u32>>,
        reply: Result<Value, (String, String)>,
    }

    impl SoapClient for CannedClient {
        fn call(&self, _operation: &str, _params: &Value) -> Result<Value, TransportError> {
            *self.calls.borrow_mut() += 1;
            match &self.reply {
                Ok(value) => Ok(value.clone()),
                Err((code, message)) => Err(TransportError::Fault {
                    code: code.clone(),
                    message: message.clone(),
                }),
            }
        }
    }

    struct CannedFactory {
        calls: Rc<RefCell<u32>>,
        created: Rc<RefCell<u32>>,
        reply: Result<Value, (String, String)>,
    }

    impl SoapClientFactory for CannedFactory {
        fn create(&self, _binding: &SoapBinding) -> Result<Box<dyn SoapClient>, AfipError> {
            *self.created.borrow_mut() += 1;
            Ok(Box::new(CannedClient {
                calls: self.calls.clone(),
                reply: self.reply.clone(),
            }))
        }
    }

    struct Fixture {
        dispatcher: ServiceDispatcher,
        calls: Rc<RefCell<u32>>,
        created: Rc<RefCell<u32>>,
        _dir: tempfile::TempDir,
    }

    fn fixture(reply: Result<Value, (String, String)>) -> Fixture {
        let dir = tempfile::tempdir().expect("tempdir");
        let resources = dir.path().join("resources");
        std::fs::create_dir_all(&resources).expect("resources dir");
        std::fs::write(resources.join("t.wsdl"), b"<definitions/>").expect("wsdl");
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, b"cert").expect("cert");
        std::fs::write(&key, b"key").expect("key");

        let credentials = Credentials::new(
            Cuit::new("20294192345").expect("cuit"),
            Environment::Testing,
            &cert,
            &key,
        )
        .expect("credentials")
        .with_resources_dir(&resources)
        .with_cache_dir(dir.path().join("cache"));

        let registration =
            ServiceRegistration::generic("svc", "p.wsdl", "https://p", "t.wsdl", "https://t")
                .expect("registration");

        let calls = Rc::new(RefCell::new(0));
        let created = Rc::new(RefCell::new(0));
        let dispatcher = ServiceDispatcher::with_factories(
            credentials,
            registration,
            Box::new(CannedFactory {
                calls: calls.clone(),
                created: created.clone(),
                reply,
            }),
            Box::new(CannedFactory {
                calls: Rc::new(RefCell::new(0)),
                created: Rc::new(RefCell::new(0)),
                reply: Ok(Value::Null),
            }),
        )
        .expect("dispatcher");
        Fixture {
            dispatcher,
            calls,
            created,
            _dir: dir,
        }
    }

    #[test]
    fn execute_returns_raw_result() {
        let mut fx = fixture(Ok(json!({"FEDummyResult": {"AppServer": "OK"}})));
        let result = fx.dispatcher.execute("FEDummy", &json!({})).expect("result");
        assert_eq!(result["FEDummyResult"]["AppServer"], "OK");
        assert_eq!(*fx.calls.borrow(), 1);
    }

    #[test]
    fn transport_client_is_built_once() {
        let mut fx = fixture(Ok(json!("ok")));
        fx.dispatcher.execute("OpA", &json!({})).expect("a");
        fx.dispatcher.execute("OpB", &json!({})).expect("b");
        assert_eq!(*fx.created.borrow(), 1, "one client per dispatcher");
        assert_eq!(*fx.calls.borrow(), 2);
    }

    #[test]
    fn transport_fault_becomes_soap_fault_with_operation() {
        let mut fx = fixture(Err(("soap:Server".into(), "internal error".into())));
        let err = fx
            .dispatcher
            .execute("FECAESolicitar", &json!({}))
            .expect_err("must fault");
        match err {
            AfipError::SoapFault {
                operation,
                code,
                message,
            } => {
                assert_eq!(operation, "FECAESolicitar");
                assert_eq!(code, "soap:Server");
                assert_eq!(message, "internal error");
            }
            other => panic!("expected soap fault, got {other}"),
        }
    }

    #[test]
    fn fault_marked_result_becomes_soap_fault() {
        let mut fx = fixture(Ok(json!({
            "faultcode": "soap:Client",
            "faultstring": "bad token"
        })));
        let err = fx
            .dispatcher
            .execute("FEDummy", &json!({}))
            .expect_err("must fault");
        match err {
            AfipError::SoapFault { code, message, .. } => {
                assert_eq!(code, "soap:Client");
                assert_eq!(message, "bad token");
            }
            other => panic!("expected soap fault, got {other}"),
        }
    }

    #[test]
    fn missing_wsdl_is_a_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, b"cert").expect("cert");
        std::fs::write(&key, b"key").expect("key");
        let credentials = Credentials::new(
            Cuit::new("20294192345").expect("cuit"),
            Environment::Testing,
            &cert,
            &key,
        )
        .expect("credentials")
        .with_resources_dir(dir.path().join("no-such-dir"));

        let registration =
            ServiceRegistration::generic("svc", "p.wsdl", "https://p", "t.wsdl", "https://t")
                .expect("registration");
        let err = match ServiceDispatcher::new(credentials, registration) {
            Ok(_) => panic!("construction without a resolvable WSDL must fail"),
            Err(err) => err,
        };
        assert!(matches!(err, AfipError::Config { ref field, .. } if field == "wsdl"));
    }

    #[test]
    fn custom_wsdl_dir_takes_precedence() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resources = dir.path().join("resources");
        let custom = dir.path().join("custom");
        std::fs::create_dir_all(&resources).expect("resources");
        std::fs::create_dir_all(&custom).expect("custom");
        std::fs::write(resources.join("t.wsdl"), b"builtin").expect("wsdl");
        std::fs::write(custom.join("t.wsdl"), b"override").expect("wsdl");
        let cert = dir.path().join("cert.pem");
        let key = dir.path().join("key.pem");
        std::fs::write(&cert, b"cert").expect("cert");
        std::fs::write(&key, b"key").expect("key");

        let credentials = Credentials::new(
            Cuit::new("20294192345").expect("cuit"),
            Environment::Testing,
            &cert,
            &key,
        )
        .expect("credentials")
        .with_resources_dir(&resources)
        .with_custom_wsdl_dir(&custom);

        let registration =
            ServiceRegistration::generic("svc", "p.wsdl", "https://p", "t.wsdl", "https://t")
                .expect("registration");
        let dispatcher = ServiceDispatcher::new(credentials, registration).expect("dispatcher");
        assert!(dispatcher.wsdl_path().starts_with(&custom));
    }
}
