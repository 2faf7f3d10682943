use crate::{
    domain::common::{LoanboardConfig, entities::app_errors::CoreError, services::Service},
    infrastructure::record_source::AnyRecordSource,
};

pub type LoanboardService = Service<AnyRecordSource>;

pub async fn create_service(config: LoanboardConfig) -> Result<LoanboardService, CoreError> {
    let record_source = AnyRecordSource::from_config(&config.source)?;
    tracing::info!(
        debounce_ms = config.refresh_debounce.as_millis() as u64,
        "listing service ready"
    );

    Ok(Service::new(record_source, config.refresh_debounce))
}
