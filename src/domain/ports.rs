use crate::utils::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Resolves coordinates to an address document.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Value>;
}

/// Population counts keyed by ZIP code tabulation area.
#[async_trait]
pub trait PopulationSource: Send + Sync {
    /// Population scaling is only attempted when a credential is configured.
    fn has_credential(&self) -> bool;

    async fn population_table(&self, zip: &str) -> Result<Value>;
}

#[async_trait]
pub trait PropertySource: Send + Sync {
    async fn property_results(&self, lat: f64, lon: f64) -> Result<Value>;
}
