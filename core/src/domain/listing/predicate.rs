use chrono::{DateTime, Utc};

use crate::domain::{
    common::entities::app_errors::CoreError,
    listing::{
        entities::Record,
        helpers::{
            BoundSide, parse_date_bound, parse_number_bound, value_number, value_text,
            value_timestamp,
        },
        schema::ListingSchema,
        value_objects::{DateRangeFilter, FilterState, NumericRangeFilter, is_sentinel},
    },
};

/// Case-insensitive substring match over `fields`. A blank term matches
/// everything.
pub fn matches_search(record: &Record, term: &str, fields: &[String]) -> bool {
    let term = term.trim();
    if term.is_empty() {
        return true;
    }
    contains_term(record, &term.to_lowercase(), fields)
}

fn contains_term(record: &Record, lowered: &str, fields: &[String]) -> bool {
    fields.iter().any(|field| {
        value_text(record.get(field)).is_some_and(|text| text.to_lowercase().contains(lowered))
    })
}

pub fn matches_discrete(record: &Record, field: &str, value: &str) -> bool {
    if is_sentinel(value) {
        return true;
    }
    value_text(record.get(field)).is_some_and(|text| text == value)
}

pub fn matches_relation(record: &Record, field: &str, target_id: &str) -> bool {
    matches_discrete(record, field, target_id)
}

/// Inclusive on both ends. Without bounds everything matches; with any bound
/// a missing or unparseable date does not.
pub fn matches_date_range(
    record: &Record,
    field: &str,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> bool {
    if from.is_none() && to.is_none() {
        return true;
    }
    let Some(date) = value_timestamp(record.get(field)) else {
        return false;
    };
    from.is_none_or(|from| date >= from) && to.is_none_or(|to| date <= to)
}

pub fn matches_numeric_range(
    record: &Record,
    field: &str,
    min: Option<f64>,
    max: Option<f64>,
) -> bool {
    if min.is_none() && max.is_none() {
        return true;
    }
    let Some(number) = value_number(record.get(field)) else {
        return false;
    };
    min.is_none_or(|min| number >= min) && max.is_none_or(|max| number <= max)
}

#[derive(Debug, Clone, PartialEq)]
struct Equality {
    path: String,
    expected: String,
}

#[derive(Debug, Clone, PartialEq)]
struct DateBounds {
    path: String,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
struct NumberBounds {
    path: String,
    min: Option<f64>,
    max: Option<f64>,
}

/// A filter state compiled against a schema. Sentinel and blank values are
/// dropped at build time, so `matches` only evaluates real constraints.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositePredicate {
    search: Option<(String, Vec<String>)>,
    equalities: Vec<Equality>,
    date_ranges: Vec<DateBounds>,
    numeric_ranges: Vec<NumberBounds>,
}

fn present(bound: &Option<String>) -> Option<&str> {
    bound.as_deref().map(str::trim).filter(|b| !b.is_empty())
}

fn compile_date_range(range: &DateRangeFilter) -> Result<Option<DateBounds>, CoreError> {
    let from = present(&range.from)
        .map(|raw| parse_date_bound(raw, BoundSide::Lower))
        .transpose()?;
    let to = present(&range.to)
        .map(|raw| parse_date_bound(raw, BoundSide::Upper))
        .transpose()?;

    if let (Some(from), Some(to)) = (from, to)
        && from > to
    {
        return Err(CoreError::invalid(format!(
            "date range on '{}' starts after it ends",
            range.field
        )));
    }

    if from.is_none() && to.is_none() {
        return Ok(None);
    }
    Ok(Some(DateBounds {
        path: range.field.clone(),
        from,
        to,
    }))
}

fn compile_numeric_range(range: &NumericRangeFilter) -> Result<Option<NumberBounds>, CoreError> {
    let min = present(&range.min).map(parse_number_bound).transpose()?;
    let max = present(&range.max).map(parse_number_bound).transpose()?;

    if let (Some(min), Some(max)) = (min, max)
        && min > max
    {
        return Err(CoreError::invalid(format!(
            "numeric range on '{}' has min above max",
            range.field
        )));
    }

    if min.is_none() && max.is_none() {
        return Ok(None);
    }
    Ok(Some(NumberBounds {
        path: range.field.clone(),
        min,
        max,
    }))
}

impl CompositePredicate {
    pub fn build(schema: &ListingSchema, filter: &FilterState) -> Result<Self, CoreError> {
        let term = filter.search.trim();
        let search = (!term.is_empty()).then(|| (term.to_lowercase(), schema.searchable.clone()));

        let mut equalities = Vec::new();
        for (name, value) in &filter.discrete {
            if is_sentinel(value) {
                continue;
            }
            let (path, expected) = match schema.filter_field(name) {
                Some(field) => (field.path.clone(), field.resolve_value(value).to_string()),
                None => (name.clone(), value.clone()),
            };
            equalities.push(Equality { path, expected });
        }

        if let Some(relation) = &filter.relation
            && !is_sentinel(&relation.target_id)
        {
            equalities.push(Equality {
                path: relation.field.clone(),
                expected: relation.target_id.clone(),
            });
        }

        let date_ranges = filter
            .date_range
            .iter()
            .chain(filter.preset_range.iter())
            .map(compile_date_range)
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>, _>>()?;

        let numeric_ranges = filter
            .numeric_ranges
            .iter()
            .map(compile_numeric_range)
            .filter_map(Result::transpose)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            search,
            equalities,
            date_ranges,
            numeric_ranges,
        })
    }

    /// Logical AND of every active constraint, stopping at the first miss.
    pub fn matches(&self, record: &Record) -> bool {
        if let Some((term, fields)) = &self.search
            && !contains_term(record, term, fields)
        {
            return false;
        }

        if !self
            .equalities
            .iter()
            .all(|eq| matches_discrete(record, &eq.path, &eq.expected))
        {
            return false;
        }

        if !self
            .date_ranges
            .iter()
            .all(|range| matches_date_range(record, &range.path, range.from, range.to))
        {
            return false;
        }

        self.numeric_ranges
            .iter()
            .all(|range| matches_numeric_range(record, &range.path, range.min, range.max))
    }

    /// True when no constraint survived compilation.
    pub fn is_unconstrained(&self) -> bool {
        self.search.is_none()
            && self.equalities.is_empty()
            && self.date_ranges.is_empty()
            && self.numeric_ranges.is_empty()
    }
}
