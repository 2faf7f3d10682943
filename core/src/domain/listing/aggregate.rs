use std::collections::BTreeMap;
use std::fmt;

use crate::domain::listing::{
    entities::{Record, Summary},
    helpers::{value_number, value_text},
    schema::{StatCard, StatRule},
};

type RecordPredicate = Box<dyn Fn(&Record) -> bool + Send + Sync>;

/// A named count over a record set.
pub struct CountSpec {
    pub name: String,
    predicate: RecordPredicate,
}

impl CountSpec {
    pub fn new<F>(name: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        (self.predicate)(record)
    }
}

impl fmt::Debug for CountSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountSpec").field("name", &self.name).finish()
    }
}

/// Counts for every spec in a single pass over `records`. Every spec name
/// appears in the result, zero included.
pub fn aggregate<'a, I>(records: I, specs: &[CountSpec]) -> BTreeMap<String, u64>
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut counts = vec![0u64; specs.len()];
    for record in records {
        for (count, spec) in counts.iter_mut().zip(specs) {
            if spec.matches(record) {
                *count += 1;
            }
        }
    }

    specs
        .iter()
        .map(|spec| spec.name.clone())
        .zip(counts)
        .collect()
}

fn is_present(record: &Record, path: &str) -> bool {
    value_text(record.get(path)).is_some_and(|text| !text.trim().is_empty())
        || record.get(path).is_object()
}

fn rule_matches(rule: &StatRule, record: &Record) -> bool {
    match rule {
        StatRule::Total => true,
        StatRule::FieldEquals { path, value } => {
            value_text(record.get(path)).is_some_and(|text| text == *value)
        }
        StatRule::FieldIn { path, values } => {
            value_text(record.get(path)).is_some_and(|text| values.contains(&text))
        }
        StatRule::Present { path } => is_present(record, path),
        StatRule::Absent { path } => !is_present(record, path),
        StatRule::Sum { .. } => false,
    }
}

/// Evaluates stat cards in one pass. `Sum` cards land in `totals`, every
/// other card in `counts`.
pub fn summarize<'a, I>(records: I, cards: &[StatCard]) -> Summary
where
    I: IntoIterator<Item = &'a Record>,
{
    let mut summary = Summary::default();
    for card in cards {
        if matches!(card.rule, StatRule::Sum { .. }) {
            summary.totals.insert(card.name.clone(), 0.0);
        } else {
            summary.counts.insert(card.name.clone(), 0);
        }
    }

    for record in records {
        for card in cards {
            match &card.rule {
                StatRule::Sum { path } => {
                    if let Some(total) = summary.totals.get_mut(&card.name) {
                        *total += value_number(record.get(path)).unwrap_or(0.0);
                    }
                }
                rule => {
                    if rule_matches(rule, record)
                        && let Some(count) = summary.counts.get_mut(&card.name)
                    {
                        *count += 1;
                    }
                }
            }
        }
    }

    summary
}
