use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::domain::{
    common::{debounce::Debouncer, sequencer::RequestSequencer},
    listing::{entities::Record, ports::RecordSource, schema::ListingKind},
};

pub(crate) type Snapshots = HashMap<ListingKind, Arc<Vec<Record>>>;

/// Holds the record source and the per-listing snapshots every list page is
/// served from.
pub struct Service<RS>
where
    RS: RecordSource,
{
    pub(crate) record_source: Arc<RS>,
    pub(crate) snapshots: Arc<RwLock<Snapshots>>,
    pub(crate) sequencers: Arc<HashMap<ListingKind, RequestSequencer>>,
    pub(crate) refresh_debouncers: Arc<HashMap<ListingKind, Debouncer>>,
}

impl<RS> Service<RS>
where
    RS: RecordSource,
{
    pub fn new(record_source: RS, refresh_debounce: Duration) -> Self {
        let sequencers = ListingKind::ALL
            .into_iter()
            .map(|kind| (kind, RequestSequencer::new()))
            .collect();
        let refresh_debouncers = ListingKind::ALL
            .into_iter()
            .map(|kind| (kind, Debouncer::new(refresh_debounce)))
            .collect();

        Self {
            record_source: Arc::new(record_source),
            snapshots: Arc::new(RwLock::new(HashMap::new())),
            sequencers: Arc::new(sequencers),
            refresh_debouncers: Arc::new(refresh_debouncers),
        }
    }

    /// Drops every refresh still waiting out its debounce window.
    pub fn cancel_scheduled_refreshes(&self) {
        for debouncer in self.refresh_debouncers.values() {
            debouncer.cancel();
        }
    }
}

impl<RS> Clone for Service<RS>
where
    RS: RecordSource,
{
    fn clone(&self) -> Self {
        Self {
            record_source: self.record_source.clone(),
            snapshots: self.snapshots.clone(),
            sequencers: self.sequencers.clone(),
            refresh_debouncers: self.refresh_debouncers.clone(),
        }
    }
}
