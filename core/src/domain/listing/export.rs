use crate::domain::{
    common::entities::app_errors::CoreError,
    listing::{entities::Record, schema::ExportColumn},
};

/// Renders `records` as CSV with one header row. Missing fields become
/// empty cells.
pub fn to_csv<'a>(
    columns: &[ExportColumn],
    records: impl IntoIterator<Item = &'a Record>,
) -> Result<String, CoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record(columns.iter().map(|column| column.header.as_str()))
        .map_err(csv_error)?;
    for record in records {
        writer
            .write_record(columns.iter().map(|column| record.text(&column.path)))
            .map_err(csv_error)?;
    }

    let bytes = writer.into_inner().map_err(|e| {
        tracing::error!("failed to flush csv export: {}", e);
        CoreError::InternalServerError
    })?;
    String::from_utf8(bytes).map_err(|e| {
        tracing::error!("csv export is not utf-8: {}", e);
        CoreError::InternalServerError
    })
}

fn csv_error(e: csv::Error) -> CoreError {
    tracing::error!("failed to write csv export: {}", e);
    CoreError::InternalServerError
}
