use std::io::ErrorKind;
use std::path::PathBuf;

use serde_json::Value;

use crate::domain::{
    common::{FixturesConfig, entities::app_errors::CoreError},
    listing::{ListingKind, ports::RecordSource},
};

/// Serves listings from `{directory}/{kind}.json`, for demos and local runs
/// without a backend.
#[derive(Debug, Clone)]
pub struct FixtureRecordSource {
    directory: PathBuf,
}

impl FixtureRecordSource {
    pub fn new(config: &FixturesConfig) -> Self {
        Self {
            directory: config.directory.clone(),
        }
    }

    pub fn path_for(&self, kind: ListingKind) -> PathBuf {
        self.directory.join(format!("{}.json", kind))
    }
}

impl RecordSource for FixtureRecordSource {
    async fn fetch_records(&self, kind: ListingKind) -> Result<Value, CoreError> {
        let path = self.path_for(kind);
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                CoreError::NotFound(format!("fixture {}", path.display()))
            } else {
                tracing::error!("Failed to read fixture {}: {}", path.display(), e);
                CoreError::InternalServerError
            }
        })?;

        serde_json::from_str(&raw).map_err(|e| {
            tracing::error!("Malformed fixture {}: {}", path.display(), e);
            CoreError::ExternalServiceError(format!("malformed fixture {}: {}", path.display(), e))
        })
    }
}
