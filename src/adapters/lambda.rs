//! Lambda function-URL hosting for the ingress.

use crate::core::ingress::{Ingress, IngressRequest, IngressResponse};
use crate::domain::ports::{PopulationSource, PropertySource, ReverseGeocoder};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUrlRequest {
    #[serde(default)]
    pub raw_path: Option<String>,
    pub request_context: RequestContext,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestContext {
    pub http: HttpContext,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpContext {
    pub method: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FunctionUrlResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub is_base64_encoded: bool,
}

impl FunctionUrlRequest {
    pub fn path(&self) -> &str {
        self.raw_path
            .as_deref()
            .unwrap_or(&self.request_context.http.path)
    }

    /// Decoded request body. An undecodable body is treated as empty so the
    /// route's own parse failure handling applies.
    pub fn body_bytes(&self) -> Vec<u8> {
        let Some(body) = &self.body else {
            return Vec::new();
        };

        if !self.is_base64_encoded {
            return body.as_bytes().to_vec();
        }

        base64::engine::general_purpose::STANDARD
            .decode(body)
            .unwrap_or_else(|e| {
                tracing::warn!("Request body is not valid base64: {}", e);
                Vec::new()
            })
    }
}

impl From<IngressResponse> for FunctionUrlResponse {
    fn from(response: IngressResponse) -> Self {
        Self {
            status_code: response.status,
            headers: response
                .headers
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            is_base64_encoded: false,
        }
    }
}

pub async fn handle_event<G, P, Q>(
    ingress: &Ingress<G, P, Q>,
    event: FunctionUrlRequest,
) -> FunctionUrlResponse
where
    G: ReverseGeocoder,
    P: PopulationSource,
    Q: PropertySource,
{
    let body = event.body_bytes();

    ingress
        .handle(IngressRequest {
            method: &event.request_context.http.method,
            path: event.path(),
            body: &body,
        })
        .await
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::broker::LookupBroker;
    use crate::core::ingress::CorsPolicy;
    use crate::core::test_support::{StubGeocoder, StubPopulation, StubProperty};
    use crate::domain::model::PopulationPolicy;
    use serde_json::json;

    fn event(method: &str, path: &str, body: Option<&str>, encoded: bool) -> FunctionUrlRequest {
        serde_json::from_value(json!({
            "version": "2.0",
            "rawPath": path,
            "rawQueryString": "",
            "headers": {"content-type": "application/json"},
            "requestContext": {"http": {"method": method, "path": path}},
            "body": body,
            "isBase64Encoded": encoded
        }))
        .unwrap()
    }

    fn ingress() -> Ingress<StubGeocoder, StubPopulation, StubProperty> {
        Ingress::new(
            LookupBroker::new(
                StubGeocoder::postcode("76102"),
                StubPopulation::without_credential(),
                StubProperty::empty(),
                PopulationPolicy::default(),
            ),
            CorsPolicy::new("https://hailspectrum.com"),
        )
    }

    #[tokio::test]
    async fn test_census_event() {
        let response = handle_event(
            &ingress(),
            event("POST", "/census-lookup", Some(r#"{"lat": 32.75, "lon": -97.33}"#), false),
        )
        .await;

        assert_eq!(response.status_code, 200);
        assert_eq!(
            response.headers.get("Access-Control-Allow-Origin").map(String::as_str),
            Some("https://hailspectrum.com")
        );
        let body: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({"zip": "76102", "population": 7383}));
    }

    #[tokio::test]
    async fn test_base64_body_is_decoded() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(r#"{"lat": 1.0, "lon": 2.0}"#);
        let response = handle_event(
            &ingress(),
            event("POST", "/property-lookup", Some(&encoded), true),
        )
        .await;

        assert_eq!(response.status_code, 404);
        assert_eq!(response.body, r#"{"error":"No property data found"}"#);
    }

    #[tokio::test]
    async fn test_options_event_has_empty_body() {
        let response = handle_event(&ingress(), event("OPTIONS", "/census-lookup", None, false)).await;

        assert_eq!(response.status_code, 200);
        assert!(response.body.is_empty());
        assert_eq!(response.headers.len(), 3);
    }

    #[test]
    fn test_response_serializes_camel_case() {
        let response = FunctionUrlResponse {
            status_code: 404,
            headers: BTreeMap::new(),
            body: "Not Found".to_string(),
            is_base64_encoded: false,
        };
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["statusCode"], 404);
        assert_eq!(value["isBase64Encoded"], false);
    }
}
