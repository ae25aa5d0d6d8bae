use crate::adapters::http::{CensusPopulation, GeocodioProperty, NominatimGeocoder};
use crate::config::BrokerConfig;
use crate::domain::extract;
use crate::domain::model::{
    CensusLookupRequest, CensusLookupResult, PopulationPolicy, PropertyLookupRequest,
    PropertyRecord,
};
use crate::domain::ports::{PopulationSource, PropertySource, ReverseGeocoder};
use crate::utils::error::{BrokerError, Result};
use reqwest::Client;

/// Stateless translator between the map client and the upstream APIs.
///
/// The two operations fail differently on purpose: census lookups always
/// produce a usable answer, property lookups report why they failed.
pub struct LookupBroker<G, P, Q> {
    geocoder: G,
    population: P,
    property: Q,
    policy: PopulationPolicy,
}

pub type HttpBroker = LookupBroker<NominatimGeocoder, CensusPopulation, GeocodioProperty>;

impl HttpBroker {
    pub fn from_config(config: &BrokerConfig) -> Self {
        let client = Client::new();

        Self::new(
            NominatimGeocoder::new(client.clone(), &config.nominatim_url, &config.user_agent),
            CensusPopulation::new(
                client.clone(),
                &config.census_url,
                config.census_api_key.clone(),
            ),
            GeocodioProperty::new(client, &config.geocodio_url, config.geocodio_api_key.clone()),
            config.policy,
        )
    }
}

impl<G, P, Q> LookupBroker<G, P, Q>
where
    G: ReverseGeocoder,
    P: PopulationSource,
    Q: PropertySource,
{
    pub fn new(geocoder: G, population: P, property: Q, policy: PopulationPolicy) -> Self {
        Self {
            geocoder,
            population,
            property,
            policy,
        }
    }

    pub fn policy(&self) -> &PopulationPolicy {
        &self.policy
    }

    /// Resolves a ZIP code and impact population. Never fails.
    pub async fn resolve_census(&self, request: CensusLookupRequest) -> CensusLookupResult {
        match self.try_resolve_census(request).await {
            Ok(result) => {
                tracing::debug!("Census lookup resolved: {:?}", result);
                result
            }
            Err(e) => {
                tracing::warn!(
                    "Census lookup for ({}, {}) degraded to fallback: {}",
                    request.lat,
                    request.lon,
                    e
                );
                self.census_fallback()
            }
        }
    }

    pub fn census_fallback(&self) -> CensusLookupResult {
        CensusLookupResult::fallback(self.policy.default_population)
    }

    async fn try_resolve_census(&self, request: CensusLookupRequest) -> Result<CensusLookupResult> {
        let document = self.geocoder.reverse(request.lat, request.lon).await?;

        let Some(zip) = extract::postal_code(&document).and_then(extract::normalize_zip) else {
            tracing::debug!("No usable postcode for ({}, {})", request.lat, request.lon);
            return Ok(self.census_fallback());
        };

        if !self.population.has_credential() {
            return Ok(CensusLookupResult {
                zip,
                population: self.policy.default_population,
            });
        }

        let table = self.population.population_table(&zip).await?;

        let population = match extract::population_cell(&table) {
            Some(raw) => self.policy.scale(raw),
            None => {
                tracing::warn!("Census table for ZCTA {} had no population row", zip);
                self.policy.default_population
            }
        };

        Ok(CensusLookupResult { zip, population })
    }

    /// Resolves property attributes. `BrokerError::NoData` means the upstream
    /// answered but had no result for the location.
    pub async fn resolve_property(&self, request: PropertyLookupRequest) -> Result<PropertyRecord> {
        let document = self
            .property
            .property_results(request.lat, request.lon)
            .await?;

        let result = extract::first_result(&document).ok_or(BrokerError::NoData)?;

        Ok(extract::property_record(result))
    }
}
