use serde_json::Value;

use crate::domain::{
    common::{RecordSourceConfig, entities::app_errors::CoreError},
    listing::{ListingKind, ports::RecordSource},
};

pub mod fixtures;
pub mod http;

pub use fixtures::FixtureRecordSource;
pub use http::HttpRecordSource;

/// The configured source, picked at startup.
#[derive(Debug, Clone)]
pub enum AnyRecordSource {
    Http(HttpRecordSource),
    Fixtures(FixtureRecordSource),
}

impl AnyRecordSource {
    pub fn from_config(config: &RecordSourceConfig) -> Result<Self, CoreError> {
        match config {
            RecordSourceConfig::Upstream(upstream) => {
                HttpRecordSource::new(upstream).map(AnyRecordSource::Http)
            }
            RecordSourceConfig::Fixtures(fixtures) => Ok(AnyRecordSource::Fixtures(
                FixtureRecordSource::new(fixtures),
            )),
        }
    }
}

impl RecordSource for AnyRecordSource {
    async fn fetch_records(&self, kind: ListingKind) -> Result<Value, CoreError> {
        match self {
            AnyRecordSource::Http(source) => source.fetch_records(kind).await,
            AnyRecordSource::Fixtures(source) => source.fetch_records(kind).await,
        }
    }
}
