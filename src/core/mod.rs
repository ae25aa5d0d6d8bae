pub mod broker;
pub mod ingress;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{CensusLookupResult, PopulationPolicy, PropertyRecord};
pub use crate::domain::ports::{PopulationSource, PropertySource, ReverseGeocoder};
pub use crate::utils::error::Result;
