//! Unwraps the record array out of whatever envelope the backend answered
//! with (`[...]`, `{data: [...]}`, `{data: {data: {items: [...]}}}`, ...).

use serde_json::Value;
use tracing::debug;

use crate::domain::listing::{
    entities::Record,
    helpers::{lookup, value_text},
    schema::{Derivation, ListingSchema},
};

const COLLECTION_KEYS: [&str; 13] = [
    "items",
    "results",
    "users",
    "customers",
    "loans",
    "branches",
    "repayments",
    "loanTypes",
    "documentTypes",
    "auditLogs",
    "unions",
    "unionMembers",
    "assignments",
];

const ENVELOPES: [&str; 3] = ["", "data", "data.data"];

/// Paths probed after the caller's own, in order.
pub fn default_paths() -> Vec<String> {
    let mut paths: Vec<String> = ENVELOPES.iter().map(|p| p.to_string()).collect();
    for envelope in ENVELOPES {
        for key in COLLECTION_KEYS {
            if envelope.is_empty() {
                paths.push(key.to_string());
            } else {
                paths.push(format!("{}.{}", envelope, key));
            }
        }
    }
    paths
}

fn locate<'a>(payload: &'a Value, paths: &[String]) -> Option<(String, &'a Vec<Value>)> {
    paths
        .iter()
        .cloned()
        .chain(default_paths())
        .find_map(|path| match lookup(payload, &path) {
            Value::Array(items) => Some((path, items)),
            _ => None,
        })
}

/// Length of the array `normalize_records` would unwrap, without copying it.
pub fn record_count(payload: &Value, paths: &[String]) -> usize {
    locate(payload, paths).map_or(0, |(_, items)| items.len())
}

/// Returns the first array found at `paths` or at a default path. Never
/// fails: an unrecognised payload is an empty list.
pub fn normalize_records(payload: &Value, paths: &[String]) -> Vec<Record> {
    let Some((path, items)) = locate(payload, paths) else {
        debug!("no record array found in payload, treating as empty");
        return Vec::new();
    };

    let records: Vec<Record> = items
        .iter()
        .filter_map(|item| Record::from_value(item.clone()))
        .collect();

    if records.len() != items.len() {
        debug!(
            path = %path,
            skipped = items.len() - records.len(),
            "skipped non-object entries while normalizing"
        );
    }

    records
}

/// Unwraps with the schema's paths and fills in its derived fields.
pub fn normalize_for_schema(payload: &Value, schema: &ListingSchema) -> Vec<Record> {
    let mut records = normalize_records(payload, &schema.normalizer_paths);
    for record in &mut records {
        apply_derivations(record, &schema.derived);
    }
    records
}

fn non_empty_text(record: &Record, path: &str) -> Option<String> {
    value_text(record.get(path))
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

pub fn apply_derivations(record: &mut Record, derivations: &[Derivation]) {
    for derivation in derivations {
        match derivation {
            Derivation::FullName {
                target,
                first,
                last,
                fallbacks,
            } => {
                if non_empty_text(record, target).is_some() {
                    continue;
                }
                let full = match (non_empty_text(record, first), non_empty_text(record, last)) {
                    (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
                    _ => fallbacks.iter().find_map(|path| non_empty_text(record, path)),
                };
                if let Some(full) = full {
                    record.set(target, Value::String(full));
                }
            }
            Derivation::StatusFromFlag {
                target,
                flag,
                active,
                inactive,
            } => {
                if non_empty_text(record, target).is_some() {
                    continue;
                }
                let label = match record.get(flag) {
                    Value::Bool(false) => inactive,
                    _ => active,
                };
                record.set(target, Value::String(label.clone()));
            }
        }
    }
}
