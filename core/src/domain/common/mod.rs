use std::path::PathBuf;
use std::time::Duration;

use chrono::{NaiveDate, Utc};

pub mod debounce;
pub mod entities;
pub mod sequencer;
pub mod services;

#[derive(Clone, Debug)]
pub struct LoanboardConfig {
    pub source: RecordSourceConfig,
    /// Quiet period before a scheduled refresh runs.
    pub refresh_debounce: Duration,
}

#[derive(Clone, Debug)]
pub enum RecordSourceConfig {
    Upstream(UpstreamConfig),
    Fixtures(FixturesConfig),
}

#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub page_limit: u32,
    pub timeout: Duration,
}

#[derive(Clone, Debug)]
pub struct FixturesConfig {
    pub directory: PathBuf,
}

pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}
