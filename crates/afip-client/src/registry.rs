//! # Service Registrations
//!
//! Data-driven registration records replace the original SDK generation's
//! subclass-per-service pattern: every remote service is a row —
//! (WSDL, endpoint) per environment plus protocol version — selected by
//! environment flag at call time. Pre-registered AFIP services ship in
//! [`ServiceRegistry::builtin`]; anything else goes through
//! [`ServiceRegistration::generic`].

use std::collections::BTreeMap;

use afip_core::{AfipError, Environment};

use crate::transport::SoapVersion;

/// Registration record for one remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRegistration {
    /// Logical service name; also the ticket-cache key.
    pub service: String,
    /// WSDL file name for production.
    pub wsdl_production: String,
    /// Endpoint URL for production.
    pub endpoint_production: String,
    /// WSDL file name for testing.
    pub wsdl_testing: String,
    /// Endpoint URL for testing.
    pub endpoint_testing: String,
    /// SOAP protocol version the service binds.
    pub soap_version: SoapVersion,
    /// Target namespace for operation elements, when declared.
    pub namespace: Option<String>,
}

impl ServiceRegistration {
    /// Build a caller-supplied (generic) registration.
    ///
    /// All five fields are required; the first missing one is named in the
    /// error.
    pub fn generic(
        service: &str,
        wsdl_production: &str,
        endpoint_production: &str,
        wsdl_testing: &str,
        endpoint_testing: &str,
    ) -> Result<Self, AfipError> {
        let required = [
            ("service", service),
            ("wsdlProduction", wsdl_production),
            ("endpointProduction", endpoint_production),
            ("wsdlTesting", wsdl_testing),
            ("endpointTesting", endpoint_testing),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(AfipError::WebService {
                    context: name.into(),
                    reason: "required registration field is missing".into(),
                });
            }
        }
        Ok(Self {
            service: service.into(),
            wsdl_production: wsdl_production.into(),
            endpoint_production: endpoint_production.into(),
            wsdl_testing: wsdl_testing.into(),
            endpoint_testing: endpoint_testing.into(),
            soap_version: SoapVersion::Soap11,
            namespace: None,
        })
    }

    /// Override the SOAP protocol version (defaults to 1.1).
    pub fn with_soap_version(mut self, version: SoapVersion) -> Self {
        self.soap_version = version;
        self
    }

    /// Declare the service's target namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// WSDL file name for the given environment.
    pub fn wsdl_for(&self, environment: Environment) -> &str {
        match environment {
            Environment::Production => &self.wsdl_production,
            Environment::Testing => &self.wsdl_testing,
        }
    }

    /// Endpoint URL for the given environment.
    pub fn endpoint_for(&self, environment: Environment) -> &str {
        match environment {
            Environment::Production => &self.endpoint_production,
            Environment::Testing => &self.endpoint_testing,
        }
    }
}

/// Name → registration table for the pre-registered AFIP services.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, ServiceRegistration>,
}

impl ServiceRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry of services the SDK ships registrations for.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for registration in builtin_registrations() {
            registry.register(registration);
        }
        registry
    }

    /// Add or replace a registration.
    pub fn register(&mut self, registration: ServiceRegistration) {
        self.services
            .insert(registration.service.clone(), registration);
    }

    /// Look up a registration by service name.
    ///
    /// Unknown names are a Configuration error.
    pub fn get(&self, service: &str) -> Result<&ServiceRegistration, AfipError> {
        self.services.get(service).ok_or_else(|| AfipError::Config {
            field: "service".into(),
            reason: format!("unknown service {service:?}"),
        })
    }

    /// Names of every registered service, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }
}

fn builtin_registrations() -> Vec<ServiceRegistration> {
    let table: [(&str, &str, &str, SoapVersion, Option<&str>); 7] = [
        (
            "wsfe",
            "https://servicios1.afip.gov.ar/wsfev1/service.asmx",
            "https://wswhomo.afip.gov.ar/wsfev1/service.asmx",
            SoapVersion::Soap12,
            Some("http://ar.gov.afip.dif.FEV1/"),
        ),
        (
            "wsfex",
            "https://servicios1.afip.gov.ar/wsfexv1/service.asmx",
            "https://wswhomo.afip.gov.ar/wsfexv1/service.asmx",
            SoapVersion::Soap11,
            Some("http://ar.gov.afip.dif.fexv1/"),
        ),
        (
            "wsbfe",
            "https://servicios1.afip.gov.ar/wsbfev1/service.asmx",
            "https://wswhomo.afip.gov.ar/wsbfev1/service.asmx",
            SoapVersion::Soap11,
            Some("http://ar.gov.afip.dif.bfev1/"),
        ),
        (
            "wsmtxca",
            "https://serviciosjava.afip.gob.ar/wsmtxca/services/MTXCAService",
            "https://fwshomo.afip.gov.ar/wsmtxca/services/MTXCAService",
            SoapVersion::Soap11,
            None,
        ),
        (
            "ws_sr_padron_a4",
            "https://aws.afip.gov.ar/sr-padron/webservices/personaServiceA4",
            "https://awshomo.afip.gov.ar/sr-padron/webservices/personaServiceA4",
            SoapVersion::Soap11,
            None,
        ),
        (
            "ws_sr_padron_a5",
            "https://aws.afip.gov.ar/sr-padron/webservices/personaServiceA5",
            "https://awshomo.afip.gov.ar/sr-padron/webservices/personaServiceA5",
            SoapVersion::Soap11,
            None,
        ),
        (
            "ws_sr_constancia_inscripcion",
            "https://aws.afip.gov.ar/sr-padron/webservices/constanciaInscripcion",
            "https://awshomo.afip.gov.ar/sr-padron/webservices/constanciaInscripcion",
            SoapVersion::Soap11,
            None,
        ),
    ];

    table
        .into_iter()
        .map(|(service, prod, test, version, namespace)| {
            let mut registration = ServiceRegistration {
                service: service.into(),
                wsdl_production: format!("{service}-production.wsdl"),
                endpoint_production: prod.into(),
                wsdl_testing: format!("{service}-testing.wsdl"),
                endpoint_testing: test.into(),
                soap_version: version,
                namespace: None,
            };
            if let Some(ns) = namespace {
                registration = registration.with_namespace(ns);
            }
            registration
        })
        .collect()
}
