use crate::core::ingress::{Ingress, IngressRequest, IngressResponse};
use crate::domain::ports::{PopulationSource, PropertySource, ReverseGeocoder};
use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{self, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Every request goes through the ingress, so the router has no routes of
/// its own, only a fallback.
pub fn router<G, P, Q>(ingress: Arc<Ingress<G, P, Q>>) -> Router
where
    G: ReverseGeocoder + 'static,
    P: PopulationSource + 'static,
    Q: PropertySource + 'static,
{
    Router::new()
        .fallback(dispatch::<G, P, Q>)
        .with_state(ingress)
        .layer(TraceLayer::new_for_http())
}

async fn dispatch<G, P, Q>(
    State(ingress): State<Arc<Ingress<G, P, Q>>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response
where
    G: ReverseGeocoder + 'static,
    P: PopulationSource + 'static,
    Q: PropertySource + 'static,
{
    let response = ingress
        .handle(IngressRequest {
            method: method.as_str(),
            path: uri.path(),
            body: &body,
        })
        .await;

    into_http(response)
}

fn into_http(response: IngressResponse) -> Response {
    let mut builder = http::Response::builder().status(response.status);
    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }

    builder.body(Body::from(response.body)).unwrap_or_else(|e| {
        tracing::error!("❌ Failed to build HTTP response: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    })
}
