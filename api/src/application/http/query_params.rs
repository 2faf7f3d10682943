use std::collections::BTreeMap;
use std::str::FromStr;

use loanboard_core::domain::{
    common::entities::app_errors::CoreError,
    listing::{
        schema::{ListingSchema, SortKind},
        value_objects::{FilterPreset, FilterState, ListingQuery, PageSpec, SortSpec},
    },
};

/// Filter operator for query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Eq,  // equals (default)
    Gte, // lower bound, inclusive
    Lte, // upper bound, inclusive
}

impl FromStr for FilterOperator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eq" => Ok(FilterOperator::Eq),
            "gte" => Ok(FilterOperator::Gte),
            "lte" => Ok(FilterOperator::Lte),
            _ => Err(()),
        }
    }
}

/// Filter condition for a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: String,
}

/// Raw listing parameters as they appear in the query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub search: Option<String>,
    pub conditions: Vec<FilterCondition>,
    pub relations: Vec<(String, String)>,
    pub preset: Option<String>,
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

/// Same cap as the JSON body's `page_size`.
pub const MAX_PAGE_SIZE: i64 = 1000;

fn bracketed(rest: &str) -> Option<(&str, &str)> {
    let end = rest.find(']')?;
    Some((&rest[..end], &rest[end + 1..]))
}

fn parse_int(key: &str, value: &str) -> Result<i64, String> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("{} must be an integer, got '{}'", key, value))
}

impl QueryParams {
    /// Parse from query string map
    /// Handles formats like:
    /// - search=term
    /// - filter[field]=value (defaults to eq)
    /// - filter[field][gte|lte]=value
    /// - relation[field]=id
    /// - preset=today|this_week|this_month
    /// - sort=field or sort=-field
    /// - page=1, page_size=20
    pub fn from_query_map(query_map: &BTreeMap<String, String>) -> Result<Self, String> {
        let mut params = QueryParams::default();

        for (key, value) in query_map {
            if let Some(filter_key) = key.strip_prefix("filter[") {
                let (field, remaining) =
                    bracketed(filter_key).ok_or_else(|| format!("malformed filter key '{}'", key))?;

                let operator = if remaining.is_empty() {
                    FilterOperator::Eq
                } else {
                    remaining
                        .strip_prefix('[')
                        .and_then(|r| r.strip_suffix(']'))
                        .and_then(|op| op.parse::<FilterOperator>().ok())
                        .ok_or_else(|| format!("unsupported filter operator in '{}'", key))?
                };

                params.conditions.push(FilterCondition {
                    field: field.to_string(),
                    operator,
                    value: value.clone(),
                });
            } else if let Some(relation_key) = key.strip_prefix("relation[") {
                let (field, _) = bracketed(relation_key)
                    .ok_or_else(|| format!("malformed relation key '{}'", key))?;
                params.relations.push((field.to_string(), value.clone()));
            } else {
                match key.as_str() {
                    "search" => params.search = Some(value.clone()),
                    "preset" => params.preset = Some(value.clone()),
                    "sort" => params.sort = Some(value.clone()),
                    "page" => params.page = Some(parse_int(key, value)?),
                    "page_size" => params.page_size = Some(parse_int(key, value)?),
                    _ => {}
                }
            }
        }

        Ok(params)
    }

    /// Resolves the raw parameters against a listing's schema. Range bounds
    /// on a date field become the date range; any other field gets a numeric
    /// range.
    pub fn into_listing_query(self, schema: &ListingSchema) -> Result<ListingQuery, CoreError> {
        let mut filter = FilterState::new().with_search(self.search.unwrap_or_default());
        let mut date_range: Option<(String, Option<String>, Option<String>)> = None;
        let mut numeric: BTreeMap<String, (Option<String>, Option<String>)> = BTreeMap::new();

        for condition in self.conditions {
            match condition.operator {
                FilterOperator::Eq => {
                    filter = filter.with_discrete(condition.field, condition.value);
                }
                operator if is_date_field(schema, &condition.field) => {
                    let range = date_range.get_or_insert_with(|| {
                        (condition.field.clone(), None, None)
                    });
                    if range.0 != condition.field {
                        return Err(CoreError::invalid(format!(
                            "only one date range is supported, got '{}' and '{}'",
                            range.0, condition.field
                        )));
                    }
                    match operator {
                        FilterOperator::Gte => range.1 = Some(condition.value),
                        _ => range.2 = Some(condition.value),
                    }
                }
                operator => {
                    let range = numeric.entry(condition.field).or_default();
                    match operator {
                        FilterOperator::Gte => range.0 = Some(condition.value),
                        _ => range.1 = Some(condition.value),
                    }
                }
            }
        }

        if let Some((field, from, to)) = date_range {
            filter = filter.with_date_range(field, from, to);
        }
        for (field, (min, max)) in numeric {
            filter = filter.with_numeric_range(field, min, max);
        }

        match self.relations.as_slice() {
            [] => {}
            [(field, target_id)] => filter = filter.with_relation(field, target_id),
            _ => return Err(CoreError::invalid("only one relation filter is supported")),
        }

        let preset = self
            .preset
            .filter(|p| !p.trim().is_empty())
            .map(|p| p.parse::<FilterPreset>())
            .transpose()?;

        let sort = match self.sort.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                SortSpec::parse(raw)
                    .ok_or_else(|| CoreError::invalid(format!("malformed sort '{}'", raw)))?,
            ),
        };

        let defaults = PageSpec::default();
        let page_size = self.page_size.unwrap_or(defaults.page_size);
        if page_size > MAX_PAGE_SIZE {
            return Err(CoreError::invalid(format!(
                "page_size must be at most {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }

        Ok(ListingQuery {
            filter,
            preset,
            sort,
            page: PageSpec::new(page_size, self.page.unwrap_or(defaults.page_index)),
        })
    }
}

fn is_date_field(schema: &ListingSchema, field: &str) -> bool {
    field == schema.date_field
        || schema
            .sort_keys
            .iter()
            .any(|key| key.kind == SortKind::Date && (key.key == field || key.path == field))
}
