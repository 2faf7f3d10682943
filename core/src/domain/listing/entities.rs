use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use crate::domain::listing::{
    helpers::{lookup, value_text},
    schema::ListingKind,
    value_objects::SortSpec,
};

/// One row of back-office data (branch, user, loan, ...). The engine never
/// looks at its shape beyond the field paths a schema names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Value);

impl Record {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(Value::Object(fields))
    }

    /// Wraps a JSON object; anything else is rejected.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(_) => Some(Self(value)),
            _ => None,
        }
    }

    pub fn id(&self) -> Option<String> {
        value_text(self.get("id"))
    }

    pub fn get(&self, path: &str) -> &Value {
        lookup(&self.0, path)
    }

    pub fn text(&self, path: &str) -> String {
        value_text(self.get(path)).unwrap_or_default()
    }

    pub fn set(&mut self, field: &str, value: Value) {
        if let Value::Object(map) = &mut self.0 {
            map.insert(field.to_string(), value);
        }
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self::new(fields)
    }
}

/// One page of a filtered, sorted listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilteredResult {
    #[schema(value_type = Vec<Object>)]
    pub visible: Vec<Record>,
    pub total_filtered: usize,
    pub total_unfiltered: usize,
    /// Page actually returned after clamping.
    pub page_index: i64,
    pub page_size: i64,
    pub total_pages: i64,
}

/// Stat-card values for a dashboard page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Summary {
    pub counts: BTreeMap<String, u64>,
    pub totals: BTreeMap<String, f64>,
}

/// What a list page renders: the requested slice plus the dashboard cards of
/// the whole snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ListingPage {
    #[serde(flatten)]
    pub result: FilteredResult,
    pub sort: SortSpec,
    pub summary: Summary,
    pub active_filters: usize,
}

/// Every filtered, sorted record of a listing rendered as CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListingExport {
    pub kind: ListingKind,
    pub rows: usize,
    pub csv: String,
}

impl ListingExport {
    pub fn filename(&self) -> String {
        format!("{}.csv", self.kind)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RefreshOutcome {
    pub kind: ListingKind,
    pub records: usize,
    /// False when a newer refresh overtook this one.
    pub applied: bool,
}
