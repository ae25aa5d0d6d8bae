//! In-memory upstream stubs for unit tests.

use crate::domain::ports::{PopulationSource, PropertySource, ReverseGeocoder};
use crate::utils::error::{BrokerError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Mutex;

fn unavailable(upstream: &'static str) -> BrokerError {
    BrokerError::UpstreamStatus {
        upstream,
        status: 503,
        detail: Some("stubbed outage".to_string()),
    }
}

pub struct StubGeocoder {
    document: Option<Value>,
}

impl StubGeocoder {
    pub fn document(document: Value) -> Self {
        Self {
            document: Some(document),
        }
    }

    pub fn postcode(postcode: &str) -> Self {
        Self::document(json!({"address": {"postcode": postcode}}))
    }

    pub fn failing() -> Self {
        Self { document: None }
    }
}

#[async_trait]
impl ReverseGeocoder for StubGeocoder {
    async fn reverse(&self, _lat: f64, _lon: f64) -> Result<Value> {
        self.document.clone().ok_or_else(|| unavailable("nominatim"))
    }
}

pub struct StubPopulation {
    credential: bool,
    table: Option<Value>,
    requested: Mutex<Vec<String>>,
}

impl StubPopulation {
    pub fn table(table: Value) -> Self {
        Self {
            credential: true,
            table: Some(table),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            credential: true,
            table: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn without_credential() -> Self {
        Self {
            credential: false,
            table: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested_zips(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PopulationSource for StubPopulation {
    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn population_table(&self, zip: &str) -> Result<Value> {
        self.requested.lock().unwrap().push(zip.to_string());
        self.table.clone().ok_or_else(|| unavailable("census"))
    }
}

pub struct StubProperty {
    document: Option<Value>,
}

impl StubProperty {
    pub fn document(document: Value) -> Self {
        Self {
            document: Some(document),
        }
    }

    pub fn empty() -> Self {
        Self::document(json!({"input": {}, "results": []}))
    }

    pub fn failing() -> Self {
        Self { document: None }
    }
}

#[async_trait]
impl PropertySource for StubProperty {
    async fn property_results(&self, _lat: f64, _lon: f64) -> Result<Value> {
        self.document.clone().ok_or_else(|| unavailable("geocodio"))
    }
}
