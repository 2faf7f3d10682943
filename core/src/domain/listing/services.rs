use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::domain::{
    common::{entities::app_errors::CoreError, services::Service, today},
    listing::{
        aggregate::summarize,
        engine::ListingEngine,
        entities::{ListingExport, ListingPage, Record, RefreshOutcome, Summary},
        export::to_csv,
        normalizer::normalize_for_schema,
        ports::{ListingService, RecordSource},
        schema::{ListingKind, ListingSchema},
        value_objects::{FilterState, ListingQuery, PageSpec, SortSpec},
    },
};

impl<RS> Service<RS>
where
    RS: RecordSource,
{
    /// Fetches and normalizes `kind`, storing the result only if no newer
    /// fetch for the same kind started in the meantime.
    async fn fetch_snapshot(
        &self,
        kind: ListingKind,
    ) -> Result<(Arc<Vec<Record>>, bool), CoreError> {
        let sequencer = self
            .sequencers
            .get(&kind)
            .ok_or(CoreError::InternalServerError)?;
        let ticket = sequencer.begin();

        let payload = self
            .record_source
            .fetch_records(kind)
            .await
            .inspect_err(|e| error!("failed to fetch {} records: {}", kind, e))?;
        let records = Arc::new(normalize_for_schema(&payload, &kind.schema()));

        let mut snapshots = self.snapshots.write().await;
        if !sequencer.is_latest(ticket) {
            debug!(
                ticket = ticket.value(),
                "discarding {} fetch overtaken by a newer one", kind
            );
            return Ok((records, false));
        }
        snapshots.insert(kind, records.clone());

        Ok((records, true))
    }

    async fn snapshot(&self, kind: ListingKind) -> Result<Arc<Vec<Record>>, CoreError> {
        let cached = self.snapshots.read().await.get(&kind).cloned();
        if let Some(records) = cached {
            return Ok(records);
        }

        let (records, applied) = self.fetch_snapshot(kind).await?;
        if applied {
            return Ok(records);
        }

        let newer = self.snapshots.read().await.get(&kind).cloned();
        Ok(newer.unwrap_or(records))
    }
}

fn resolve_sort(
    schema: &ListingSchema,
    requested: Option<SortSpec>,
) -> Result<SortSpec, CoreError> {
    match requested {
        Some(sort) => Ok(sort),
        None => schema
            .initial_sort()
            .ok_or_else(|| CoreError::invalid(format!("{} has no sort keys", schema.name))),
    }
}

impl<RS> ListingService for Service<RS>
where
    RS: RecordSource + 'static,
{
    #[instrument(skip(self), fields(kind = %kind))]
    async fn refresh(&self, kind: ListingKind) -> Result<RefreshOutcome, CoreError> {
        let (records, applied) = self.fetch_snapshot(kind).await?;
        info!(records = records.len(), applied, "refreshed listing snapshot");

        Ok(RefreshOutcome {
            kind,
            records: records.len(),
            applied,
        })
    }

    fn schedule_refresh(&self, kind: ListingKind) {
        let Some(debouncer) = self.refresh_debouncers.get(&kind) else {
            return;
        };

        let service = self.clone();
        debouncer.call(move || {
            tokio::spawn(async move {
                if let Err(e) = service.refresh(kind).await {
                    error!("scheduled refresh of {} failed: {}", kind, e);
                }
            });
        });
    }

    #[instrument(skip(self, query), fields(kind = %kind))]
    async fn list(&self, kind: ListingKind, query: ListingQuery) -> Result<ListingPage, CoreError> {
        query.page.validate()?;

        let schema = kind.schema();
        let sort = resolve_sort(&schema, query.sort.clone())?;
        let filter = query.effective_filter(&schema.date_field, today());

        let records = self.snapshot(kind).await?;
        let engine = ListingEngine::new(schema);
        let result = engine.query(&records, &filter, &sort, &query.page)?;
        let summary = summarize(records.iter(), &engine.schema().stat_cards);

        debug!(
            total_filtered = result.total_filtered,
            page_index = result.page_index,
            "listing queried"
        );

        Ok(ListingPage {
            result,
            sort,
            summary,
            active_filters: filter.active_filter_count(),
        })
    }

    #[instrument(skip(self, filter), fields(kind = %kind))]
    async fn summary(&self, kind: ListingKind, filter: FilterState) -> Result<Summary, CoreError> {
        let records = self.snapshot(kind).await?;
        let engine = ListingEngine::new(kind.schema());
        let filtered = engine.filtered(&records, &filter)?;

        Ok(summarize(filtered, &engine.schema().stat_cards))
    }

    #[instrument(skip(self, query), fields(kind = %kind))]
    async fn export(
        &self,
        kind: ListingKind,
        query: ListingQuery,
    ) -> Result<ListingExport, CoreError> {
        let schema = kind.schema();
        let sort = resolve_sort(&schema, query.sort.clone())?;
        let filter = query.effective_filter(&schema.date_field, today());

        let records = self.snapshot(kind).await?;
        let everything = PageSpec::new(
            i64::try_from(records.len().max(1)).unwrap_or(i64::MAX),
            1,
        );
        let engine = ListingEngine::new(schema);
        let result = engine.query(&records, &filter, &sort, &everything)?;
        let csv = to_csv(&engine.schema().export_columns, &result.visible)?;

        info!(rows = result.total_filtered, "exported listing");

        Ok(ListingExport {
            kind,
            rows: result.total_filtered,
            csv,
        })
    }
}
