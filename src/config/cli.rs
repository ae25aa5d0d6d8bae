use crate::config::toml_config::TomlConfig;
use crate::config::BrokerConfig;
use crate::utils::error::Result;
use clap::Parser;
use std::path::PathBuf;

pub const DEFAULT_BIND: &str = "0.0.0.0:8787";

#[derive(Debug, Clone, Parser)]
#[command(name = "hail-broker")]
#[command(about = "Lookup broker for census and property data behind the hail map")]
pub struct ServerArgs {
    /// Address to listen on
    #[arg(long, env = "BROKER_BIND")]
    pub bind: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "BROKER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Origin allowed by the CORS headers
    #[arg(long, env = "ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,

    /// Census API key; enables population scaling
    #[arg(long, env = "CENSUS_API_KEY", hide_env_values = true)]
    pub census_api_key: Option<String>,

    /// Geocodio API key; required for property lookups
    #[arg(long, env = "GEOCODIO_API_KEY", hide_env_values = true)]
    pub geocodio_api_key: Option<String>,

    #[arg(long, env = "NOMINATIM_URL")]
    pub nominatim_url: Option<String>,

    #[arg(long, env = "CENSUS_URL")]
    pub census_url: Option<String>,

    #[arg(long, env = "GEOCODIO_URL")]
    pub geocodio_url: Option<String>,

    /// User-Agent sent to the reverse geocoder
    #[arg(long, env = "UPSTREAM_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Factor applied to tabulation-area population
    #[arg(long, env = "POPULATION_DAMPENING")]
    pub population_dampening: Option<f64>,

    /// Population reported when no estimate is available
    #[arg(long, env = "DEFAULT_POPULATION")]
    pub default_population: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Resolved settings for the HTTP server binary.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind: String,
    pub broker: BrokerConfig,
}

impl ServerArgs {
    /// Defaults, then the TOML file, then flags and environment variables.
    pub fn resolve(&self) -> Result<ServerSettings> {
        let file = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        let mut broker = file.apply_to(BrokerConfig::default());

        if let Some(origin) = &self.allowed_origin {
            broker.allowed_origin = origin.clone();
        }
        if let Some(url) = &self.nominatim_url {
            broker.nominatim_url = url.clone();
        }
        if let Some(url) = &self.census_url {
            broker.census_url = url.clone();
        }
        if let Some(url) = &self.geocodio_url {
            broker.geocodio_url = url.clone();
        }
        if let Some(user_agent) = &self.user_agent {
            broker.user_agent = user_agent.clone();
        }
        if let Some(key) = non_blank(&self.census_api_key) {
            broker.census_api_key = Some(key);
        }
        if let Some(key) = non_blank(&self.geocodio_api_key) {
            broker.geocodio_api_key = Some(key);
        }
        if let Some(dampening) = self.population_dampening {
            broker.policy.dampening = dampening;
        }
        if let Some(default_population) = self.default_population {
            broker.policy.default_population = default_population;
        }

        let bind = self
            .bind
            .clone()
            .or_else(|| file.bind().map(str::to_owned))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        Ok(ServerSettings { bind, broker })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}
