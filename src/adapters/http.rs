use crate::domain::ports::{PopulationSource, PropertySource, ReverseGeocoder};
use crate::utils::error::{BrokerError, Result};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use url::{form_urlencoded, Url};

pub const NOMINATIM: &str = "nominatim";
pub const CENSUS: &str = "census";
pub const GEOCODIO: &str = "geocodio";

/// reqwest 錯誤訊息帶完整 URL，查詢字串裡有金鑰
fn transport(error: reqwest::Error) -> BrokerError {
    BrokerError::Transport(error.without_url())
}

/// Sends one request and parses the body as JSON. Every call is attempted
/// exactly once.
async fn fetch_json(request: RequestBuilder, upstream: &'static str) -> Result<Value> {
    let response = request.send().await.map_err(transport)?;
    let status = response.status();

    tracing::debug!("{} response status: {}", upstream, status);

    if !status.is_success() {
        // 上游錯誤通常帶有 {"error": "..."}，保留給呼叫端
        let detail = response
            .text()
            .await
            .ok()
            .and_then(|body| serde_json::from_str::<Value>(&body).ok())
            .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_owned));

        return Err(BrokerError::UpstreamStatus {
            upstream,
            status: status.as_u16(),
            detail,
        });
    }

    let body = response.text().await.map_err(transport)?;
    serde_json::from_str(&body).map_err(|e| BrokerError::MalformedPayload {
        upstream,
        message: e.to_string(),
    })
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// OpenStreetMap Nominatim reverse geocoder.
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    user_agent: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>, user_agent: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Value> {
        let url = endpoint(&self.base_url, "reverse");
        tracing::debug!("Reverse geocoding ({}, {}) via {}", lat, lon, url);

        // Nominatim 的使用政策要求帶 User-Agent
        let request = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .query(&[("format", "json")])
            .query(&[("lat", lat), ("lon", lon)]);

        fetch_json(request, NOMINATIM).await
    }
}

/// US Census decennial PL endpoint, queried by ZIP code tabulation area.
#[derive(Debug, Clone)]
pub struct CensusPopulation {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CensusPopulation {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }

    fn table_url(&self, zip: &str, api_key: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        // form 編碼會把空白轉成 '+'，這裡保持 %20
        url.set_query(Some(&format!(
            "get=P1_001N,NAME&for=zip%20code%20tabulation%20area:{}&key={}",
            encode(zip),
            encode(api_key)
        )));
        Ok(url)
    }
}

#[async_trait]
impl PopulationSource for CensusPopulation {
    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn population_table(&self, zip: &str) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(BrokerError::MissingCredential {
                name: "CENSUS_API_KEY",
            })?;

        let url = self.table_url(zip, api_key)?;
        tracing::debug!("Requesting census population for ZCTA {}", zip);

        fetch_json(self.client.get(url), CENSUS).await
    }
}

/// Geocodio reverse geocoder with appended field data.
#[derive(Debug, Clone)]
pub struct GeocodioProperty {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GeocodioProperty {
    /// Field tier requested from Geocodio; `cd` is the congressional district set.
    pub const FIELDS: &'static str = "cd";

    pub fn new(client: Client, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key,
        }
    }
}

#[async_trait]
impl PropertySource for GeocodioProperty {
    async fn property_results(&self, lat: f64, lon: f64) -> Result<Value> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(BrokerError::MissingCredential {
                name: "GEOCODIO_API_KEY",
            })?;

        let url = endpoint(&self.base_url, "reverse");
        tracing::debug!("Requesting property data for ({}, {})", lat, lon);

        let coordinates = format!("{},{}", lat, lon);
        let request = self.client.get(url).query(&[
            ("q", coordinates.as_str()),
            ("fields", Self::FIELDS),
            ("api_key", api_key),
        ]);

        fetch_json(request, GEOCODIO).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_nominatim_sends_user_agent_and_format() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/reverse")
                .query_param("format", "json")
                .query_param("lat", "32.75")
                .query_param("lon", "-97.33")
                .header("user-agent", "HailSpectrum/1.0");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({"address": {"postcode": "76102"}}));
        });

        let geocoder = NominatimGeocoder::new(Client::new(), server.base_url(), "HailSpectrum/1.0");
        let document = geocoder.reverse(32.75, -97.33).await.unwrap();

        api_mock.assert();
        assert_eq!(document["address"]["postcode"], "76102");
    }

    #[tokio::test]
    async fn test_census_query_uses_zcta_key() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/data/2020/dec/pl")
                .query_param("get", "P1_001N,NAME")
                .query_param("for", "zip code tabulation area:76102")
                .query_param("key", "census-key");
            then.status(200)
                .json_body(serde_json::json!([["P1_001N", "NAME"], ["41500", "ZCTA5 76102"]]));
        });

        let source = CensusPopulation::new(
            Client::new(),
            server.url("/data/2020/dec/pl"),
            Some("census-key".to_string()),
        );
        assert!(source.has_credential());

        let table = source.population_table("76102").await.unwrap();

        api_mock.assert();
        assert_eq!(table[1][0], "41500");
    }

    #[tokio::test]
    async fn test_census_without_key_is_missing_credential() {
        let source = CensusPopulation::new(Client::new(), "http://127.0.0.1:1", None);
        assert!(!source.has_credential());

        let error = source.population_table("76102").await.unwrap_err();
        assert!(matches!(
            error,
            BrokerError::MissingCredential { name: "CENSUS_API_KEY" }
        ));
    }

    #[tokio::test]
    async fn test_census_empty_body_is_malformed() {
        let server = MockServer::start();
        // ZCTA 不存在時 Census 回 204 且沒有內容
        server.mock(|when, then| {
            when.method(GET);
            then.status(204);
        });

        let source = CensusPopulation::new(Client::new(), server.base_url(), Some("k".to_string()));
        let error = source.population_table("00000").await.unwrap_err();

        assert!(matches!(
            error,
            BrokerError::MalformedPayload { upstream: CENSUS, .. }
        ));
    }

    #[tokio::test]
    async fn test_geocodio_error_status_keeps_detail() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/reverse")
                .query_param("q", "32.75,-97.33")
                .query_param("fields", "cd")
                .query_param("api_key", "bad-key");
            then.status(403)
                .json_body(serde_json::json!({"error": "Invalid API key"}));
        });

        let source = GeocodioProperty::new(Client::new(), server.base_url(), Some("bad-key".to_string()));
        let error = source.property_results(32.75, -97.33).await.unwrap_err();

        api_mock.assert();
        assert_eq!(error.to_string(), "geocodio returned HTTP 403: Invalid API key");
    }

    #[tokio::test]
    async fn test_census_transport_error_hides_key() {
        let source = CensusPopulation::new(
            Client::new(),
            "http://127.0.0.1:1",
            Some("census-secret-key".to_string()),
        );

        let error = source.population_table("76102").await.unwrap_err();

        assert!(matches!(error, BrokerError::Transport(_)));
        assert!(!error.to_string().contains("census-secret-key"));
    }

    #[tokio::test]
    async fn test_geocodio_transport_error_hides_key() {
        let source = GeocodioProperty::new(
            Client::new(),
            "http://127.0.0.1:1/v1.7",
            Some("geocodio-secret-key".to_string()),
        );

        let error = source.property_results(1.0, 2.0).await.unwrap_err();

        assert!(!error.to_string().contains("geocodio-secret-key"));
        assert!(!error.to_string().contains("api_key"));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_transport_error() {
        let geocoder = NominatimGeocoder::new(Client::new(), "http://127.0.0.1:1", "HailSpectrum/1.0");
        let error = geocoder.reverse(0.0, 0.0).await.unwrap_err();
        assert!(matches!(error, BrokerError::Transport(_)));
    }
}
