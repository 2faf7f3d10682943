use serde_json::Value;

use crate::domain::{
    common::entities::app_errors::CoreError,
    listing::{
        entities::{ListingExport, ListingPage, RefreshOutcome, Summary},
        schema::ListingKind,
        value_objects::{FilterState, ListingQuery},
    },
};

/// Where raw listing payloads come from (the back-office API, fixtures, ...).
#[cfg_attr(test, mockall::automock)]
pub trait RecordSource: Send + Sync {
    fn fetch_records(
        &self,
        kind: ListingKind,
    ) -> impl Future<Output = Result<Value, CoreError>> + Send;
}

#[cfg_attr(test, mockall::automock)]
pub trait ListingService: Send + Sync {
    /// Re-fetches the snapshot for `kind`. A fetch overtaken by a newer one
    /// is discarded.
    fn refresh(
        &self,
        kind: ListingKind,
    ) -> impl Future<Output = Result<RefreshOutcome, CoreError>> + Send;

    /// Refreshes once the debounce window closes; bursts collapse into one.
    fn schedule_refresh(&self, kind: ListingKind);

    fn list(
        &self,
        kind: ListingKind,
        query: ListingQuery,
    ) -> impl Future<Output = Result<ListingPage, CoreError>> + Send;

    fn summary(
        &self,
        kind: ListingKind,
        filter: FilterState,
    ) -> impl Future<Output = Result<Summary, CoreError>> + Send;

    /// The whole filtered, sorted set as CSV. The query's page is ignored.
    fn export(
        &self,
        kind: ListingKind,
        query: ListingQuery,
    ) -> impl Future<Output = Result<ListingExport, CoreError>> + Send;
}
