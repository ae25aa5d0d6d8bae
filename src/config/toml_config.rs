use crate::config::BrokerConfig;
use crate::utils::error::{BrokerError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional TOML configuration file.
///
/// ```toml
/// [server]
/// bind = "0.0.0.0:8787"
///
/// [cors]
/// allowed_origin = "https://hailspectrum.com"
///
/// [credentials]
/// census_api_key = "${CENSUS_API_KEY}"
/// geocodio_api_key = "${GEOCODIO_API_KEY}"
///
/// [policy]
/// population_dampening = 0.3
/// default_population = 7383
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub server: Option<ServerSection>,
    pub cors: Option<CorsSection>,
    pub upstreams: Option<UpstreamsSection>,
    pub credentials: Option<CredentialsSection>,
    pub policy: Option<PolicySection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    pub bind: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CorsSection {
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamsSection {
    pub nominatim_url: Option<String>,
    pub census_url: Option<String>,
    pub geocodio_url: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsSection {
    pub census_api_key: Option<String>,
    pub geocodio_api_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicySection {
    pub population_dampening: Option<f64>,
    pub default_population: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_file_with(path.as_ref(), &|name: &str| std::env::var(name).ok())
    }

    pub fn from_file_with<F>(path: &Path, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path).map_err(BrokerError::IoError)?;
        Self::from_toml_str_with(&content, lookup)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::from_toml_str_with(content, &|name: &str| std::env::var(name).ok())
    }

    pub fn from_toml_str_with<F>(content: &str, lookup: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let processed_content = Self::substitute_env_vars(content, lookup)?;

        toml::from_str(&processed_content).map_err(|e| BrokerError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CENSUS_API_KEY})；找不到的變數保持原樣
    fn substitute_env_vars<F>(content: &str, lookup: &F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BrokerError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            lookup(var_name).unwrap_or_else(|| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn bind(&self) -> Option<&str> {
        self.server.as_ref().and_then(|s| s.bind.as_deref())
    }

    /// Overlays the values present in the file onto `config`.
    pub fn apply_to(&self, mut config: BrokerConfig) -> BrokerConfig {
        if let Some(origin) = self.cors.as_ref().and_then(|c| c.allowed_origin.clone()) {
            config.allowed_origin = origin;
        }

        if let Some(upstreams) = &self.upstreams {
            if let Some(url) = &upstreams.nominatim_url {
                config.nominatim_url = url.clone();
            }
            if let Some(url) = &upstreams.census_url {
                config.census_url = url.clone();
            }
            if let Some(url) = &upstreams.geocodio_url {
                config.geocodio_url = url.clone();
            }
            if let Some(user_agent) = &upstreams.user_agent {
                config.user_agent = user_agent.clone();
            }
        }

        if let Some(credentials) = &self.credentials {
            if let Some(key) = resolved_secret(credentials.census_api_key.as_deref()) {
                config.census_api_key = Some(key);
            }
            if let Some(key) = resolved_secret(credentials.geocodio_api_key.as_deref()) {
                config.geocodio_api_key = Some(key);
            }
        }

        if let Some(policy) = &self.policy {
            if let Some(dampening) = policy.population_dampening {
                config.policy.dampening = dampening;
            }
            if let Some(default_population) = policy.default_population {
                config.policy.default_population = default_population;
            }
        }

        config
    }
}

/// An unresolved `${VAR}` placeholder or blank value is not a credential.
fn resolved_secret(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() || (value.starts_with("${") && value.ends_with('}')) {
        None
    } else {
        Some(value.to_string())
    }
}
