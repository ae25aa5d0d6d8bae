pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "server")]
pub use crate::config::cli::{ServerArgs, ServerSettings};

pub use crate::config::BrokerConfig;
pub use crate::core::{
    broker::{HttpBroker, LookupBroker},
    ingress::{CorsPolicy, HttpIngress, Ingress, IngressRequest, IngressResponse},
};
pub use crate::domain::model::{
    CensusLookupRequest, CensusLookupResult, PopulationPolicy, PropertyLookupRequest,
    PropertyRecord,
};
pub use crate::utils::error::{BrokerError, Result};
