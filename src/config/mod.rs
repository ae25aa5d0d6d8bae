#[cfg(feature = "server")]
pub mod cli;
pub mod toml_config;

use crate::domain::model::{PopulationPolicy, DEFAULT_POPULATION, DEFAULT_POPULATION_DAMPENING};
use crate::utils::error::{BrokerError, Result};
use crate::utils::validation::{self, Validate};
use std::path::Path;

pub const DEFAULT_ALLOWED_ORIGIN: &str = "https://hailspectrum.com";
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const DEFAULT_CENSUS_URL: &str = "https://api.census.gov/data/2020/dec/pl";
pub const DEFAULT_GEOCODIO_URL: &str = "https://api.geocod.io/v1.7";
pub const DEFAULT_USER_AGENT: &str = "HailSpectrum/1.0";

/// Everything the broker needs, resolved once at startup and passed in.
#[derive(Clone, PartialEq)]
pub struct BrokerConfig {
    pub allowed_origin: String,
    pub nominatim_url: String,
    pub census_url: String,
    pub geocodio_url: String,
    pub user_agent: String,
    pub census_api_key: Option<String>,
    pub geocodio_api_key: Option<String>,
    pub policy: PopulationPolicy,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
            nominatim_url: DEFAULT_NOMINATIM_URL.to_string(),
            census_url: DEFAULT_CENSUS_URL.to_string(),
            geocodio_url: DEFAULT_GEOCODIO_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            census_api_key: None,
            geocodio_api_key: None,
            policy: PopulationPolicy {
                dampening: DEFAULT_POPULATION_DAMPENING,
                default_population: DEFAULT_POPULATION,
            },
        }
    }
}

// 金鑰不可出現在日誌
impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("allowed_origin", &self.allowed_origin)
            .field("nominatim_url", &self.nominatim_url)
            .field("census_url", &self.census_url)
            .field("geocodio_url", &self.geocodio_url)
            .field("user_agent", &self.user_agent)
            .field("census_api_key", &self.census_api_key.as_ref().map(|_| "<redacted>"))
            .field("geocodio_api_key", &self.geocodio_api_key.as_ref().map(|_| "<redacted>"))
            .field("policy", &self.policy)
            .finish()
    }
}

impl BrokerConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from a variable lookup. `BROKER_CONFIG` may
    /// name a TOML file that is applied before the individual variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut config = match get("BROKER_CONFIG") {
            Some(path) => {
                let file = toml_config::TomlConfig::from_file_with(Path::new(&path), &lookup)?;
                file.apply_to(Self::default())
            }
            None => Self::default(),
        };

        if let Some(origin) = get("ALLOWED_ORIGIN") {
            config.allowed_origin = origin;
        }
        if let Some(url) = get("NOMINATIM_URL") {
            config.nominatim_url = url;
        }
        if let Some(url) = get("CENSUS_URL") {
            config.census_url = url;
        }
        if let Some(url) = get("GEOCODIO_URL") {
            config.geocodio_url = url;
        }
        if let Some(user_agent) = get("UPSTREAM_USER_AGENT") {
            config.user_agent = user_agent;
        }
        if let Some(key) = get("CENSUS_API_KEY") {
            config.census_api_key = Some(key);
        }
        if let Some(key) = get("GEOCODIO_API_KEY") {
            config.geocodio_api_key = Some(key);
        }
        if let Some(raw) = get("POPULATION_DAMPENING") {
            config.policy.dampening = parse_number("POPULATION_DAMPENING", &raw)?;
        }
        if let Some(raw) = get("DEFAULT_POPULATION") {
            config.policy.default_population = parse_number("DEFAULT_POPULATION", &raw)?;
        }

        Ok(config)
    }

    pub fn census_scaling_enabled(&self) -> bool {
        self.census_api_key.is_some()
    }

    pub fn property_lookup_enabled(&self) -> bool {
        self.geocodio_api_key.is_some()
    }
}

fn parse_number<T>(field_name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| BrokerError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

impl Validate for BrokerConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_origin("allowed_origin", &self.allowed_origin)?;

        validation::validate_url("nominatim_url", &self.nominatim_url)?;
        validation::validate_url("census_url", &self.census_url)?;
        validation::validate_url("geocodio_url", &self.geocodio_url)?;

        validation::validate_non_empty_string("user_agent", &self.user_agent)?;

        validation::validate_range("population_dampening", self.policy.dampening, 0.0, 1.0)?;

        tracing::debug!("✅ Broker configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = BrokerConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, BrokerConfig::default());
        assert_eq!(config.policy.dampening, 0.3);
        assert_eq!(config.policy.default_population, 7383);
        assert!(!config.census_scaling_enabled());
        assert!(!config.property_lookup_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_credentials_from_environment() {
        let config = BrokerConfig::from_lookup(lookup(&[
            ("CENSUS_API_KEY", "census-key"),
            ("GEOCODIO_API_KEY", "geocodio-key"),
        ]))
        .unwrap();

        assert_eq!(config.census_api_key.as_deref(), Some("census-key"));
        assert!(config.property_lookup_enabled());
    }

    #[test]
    fn test_blank_credential_counts_as_absent() {
        let config = BrokerConfig::from_lookup(lookup(&[("CENSUS_API_KEY", "  ")])).unwrap();
        assert!(config.census_api_key.is_none());
    }

    #[test]
    fn test_policy_overrides() {
        let config = BrokerConfig::from_lookup(lookup(&[
            ("POPULATION_DAMPENING", "0.5"),
            ("DEFAULT_POPULATION", "1200"),
        ]))
        .unwrap();

        assert_eq!(config.policy.dampening, 0.5);
        assert_eq!(config.policy.default_population, 1200);
    }

    #[test]
    fn test_invalid_number_is_rejected() {
        let result = BrokerConfig::from_lookup(lookup(&[("DEFAULT_POPULATION", "lots")]));
        assert!(matches!(
            result,
            Err(BrokerError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_validation_rejects_out_of_range_dampening() {
        let mut config = BrokerConfig::default();
        config.policy.dampening = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = BrokerConfig {
            census_api_key: Some("super-secret".to_string()),
            ..BrokerConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
