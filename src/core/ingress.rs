use crate::adapters::http::{CensusPopulation, GeocodioProperty, NominatimGeocoder};
use crate::config::BrokerConfig;
use crate::core::broker::{HttpBroker, LookupBroker};
use crate::domain::model::{CensusLookupRequest, ErrorBody, PropertyLookupRequest};
use crate::domain::ports::{PopulationSource, PropertySource, ReverseGeocoder};
use crate::utils::error::BrokerError;
use serde::Serialize;

pub const CENSUS_LOOKUP_PATH: &str = "/census-lookup";
pub const PROPERTY_LOOKUP_PATH: &str = "/property-lookup";

pub const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Preflight,
    CensusLookup,
    PropertyLookup,
    NotFound,
}

impl Route {
    pub fn resolve(method: &str, path: &str) -> Self {
        if method.eq_ignore_ascii_case("OPTIONS") {
            return Route::Preflight;
        }

        let path = path.split('?').next().unwrap_or_default();
        let is_post = method.eq_ignore_ascii_case("POST");

        match path {
            CENSUS_LOOKUP_PATH if is_post => Route::CensusLookup,
            PROPERTY_LOOKUP_PATH if is_post => Route::PropertyLookup,
            _ => Route::NotFound,
        }
    }
}

/// Cross-origin headers attached to every response.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origin: String,
}

impl CorsPolicy {
    pub fn new(allowed_origin: impl Into<String>) -> Self {
        Self {
            allowed_origin: allowed_origin.into(),
        }
    }

    pub fn allowed_origin(&self) -> &str {
        &self.allowed_origin
    }

    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Access-Control-Allow-Origin", self.allowed_origin.clone()),
            ("Access-Control-Allow-Methods", ALLOW_METHODS.to_string()),
            ("Access-Control-Allow-Headers", ALLOW_HEADERS.to_string()),
        ]
    }
}

/// Transport-neutral view of an inbound request.
#[derive(Debug, Clone, Copy)]
pub struct IngressRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub body: &'a [u8],
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngressResponse {
    pub status: u16,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl IngressResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Single entry point: dispatches on method and path and applies CORS.
pub struct Ingress<G, P, Q> {
    broker: LookupBroker<G, P, Q>,
    cors: CorsPolicy,
}

pub type HttpIngress = Ingress<NominatimGeocoder, CensusPopulation, GeocodioProperty>;

impl HttpIngress {
    pub fn from_config(config: &BrokerConfig) -> Self {
        Self::new(
            HttpBroker::from_config(config),
            CorsPolicy::new(&config.allowed_origin),
        )
    }
}

impl<G, P, Q> Ingress<G, P, Q>
where
    G: ReverseGeocoder,
    P: PopulationSource,
    Q: PropertySource,
{
    pub fn new(broker: LookupBroker<G, P, Q>, cors: CorsPolicy) -> Self {
        Self { broker, cors }
    }

    pub fn broker(&self) -> &LookupBroker<G, P, Q> {
        &self.broker
    }

    pub async fn handle(&self, request: IngressRequest<'_>) -> IngressResponse {
        let route = Route::resolve(request.method, request.path);
        tracing::debug!("{} {} -> {:?}", request.method, request.path, route);

        match route {
            Route::Preflight => self.empty(200),
            Route::CensusLookup => self.census_lookup(request.body).await,
            Route::PropertyLookup => self.property_lookup(request.body).await,
            Route::NotFound => self.text(404, "Not Found"),
        }
    }

    async fn census_lookup(&self, body: &[u8]) -> IngressResponse {
        let result = match serde_json::from_slice::<CensusLookupRequest>(body) {
            Ok(request) => self.broker.resolve_census(request).await,
            Err(e) => {
                tracing::warn!("Unreadable census lookup body, using fallback: {}", e);
                self.broker.census_fallback()
            }
        };

        self.json(200, &result)
    }

    async fn property_lookup(&self, body: &[u8]) -> IngressResponse {
        let outcome = match serde_json::from_slice::<PropertyLookupRequest>(body) {
            Ok(request) => self.broker.resolve_property(request).await,
            Err(e) => Err(BrokerError::InvalidRequest {
                message: e.to_string(),
            }),
        };

        match outcome {
            Ok(record) => self.json(200, &record),
            Err(e) => {
                let status = e.status_code();
                if status >= 500 {
                    tracing::error!("❌ Property lookup failed: {}", e);
                } else {
                    tracing::info!("Property lookup found nothing: {}", e);
                }
                self.json(status, &ErrorBody::new(e.to_string()))
            }
        }
    }

    fn empty(&self, status: u16) -> IngressResponse {
        IngressResponse {
            status,
            headers: self.cors.headers(),
            body: Vec::new(),
        }
    }

    fn text(&self, status: u16, body: &str) -> IngressResponse {
        let mut response = self.empty(status);
        response
            .headers
            .push(("Content-Type", "text/plain;charset=UTF-8".to_string()));
        response.body = body.as_bytes().to_vec();
        response
    }

    fn json<T: Serialize>(&self, status: u16, body: &T) -> IngressResponse {
        match serde_json::to_vec(body) {
            Ok(bytes) => {
                let mut response = self.empty(status);
                response
                    .headers
                    .push(("Content-Type", "application/json".to_string()));
                response.body = bytes;
                response
            }
            Err(e) => {
                tracing::error!("❌ Failed to serialize response: {}", e);
                self.text(500, "Internal Server Error")
            }
        }
    }
}
