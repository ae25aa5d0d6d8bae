use serde::{Deserialize, Serialize};

/// ZIP 無法判定時的固定值
pub const UNKNOWN_ZIP: &str = "Unknown";

/// Placeholder for absent textual property attributes.
pub const UNKNOWN_TEXT: &str = "Unknown";

pub const DEFAULT_POPULATION: u64 = 7383;

/// A ZCTA covers far more ground than a storm footprint; this is a
/// calibration constant, not a measured ratio.
pub const DEFAULT_POPULATION_DAMPENING: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CensusLookupRequest {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CensusLookupResult {
    pub zip: String,
    pub population: u64,
}

impl CensusLookupResult {
    pub fn fallback(default_population: u64) -> Self {
        Self {
            zip: UNKNOWN_ZIP.to_string(),
            population: default_population,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.zip == UNKNOWN_ZIP
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropertyLookupRequest {
    pub lat: f64,
    pub lon: f64,
}

/// Normalized property attributes. Every key is always serialized;
/// absent numeric values become `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub address: String,
    pub property_type: String,
    pub year_built: Option<i64>,
    pub bedrooms: Option<i64>,
    pub bathrooms: Option<f64>,
    pub sqft: Option<i64>,
    pub lot_size: Option<f64>,
    pub assessed_value: Option<f64>,
    pub market_value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// How a raw tabulation-area count becomes an impact estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationPolicy {
    pub dampening: f64,
    pub default_population: u64,
}

impl Default for PopulationPolicy {
    fn default() -> Self {
        Self {
            dampening: DEFAULT_POPULATION_DAMPENING,
            default_population: DEFAULT_POPULATION,
        }
    }
}

impl PopulationPolicy {
    pub fn scale(&self, raw_population: u64) -> u64 {
        let scaled = (raw_population as f64 * self.dampening).round();
        if scaled.is_finite() && scaled > 0.0 {
            scaled as u64
        } else {
            0
        }
    }
}
