use std::collections::BTreeMap;

use loanboard_core::domain::{
    common::entities::app_errors::CoreError,
    listing::value_objects::{
        DateRangeFilter, FilterPreset, FilterState, ListingQuery, NumericRangeFilter, PageSpec,
        RelationFilter, SortDirection, SortSpec,
    },
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct SortValidator {
    #[validate(length(min = 1, message = "sort key is required"))]
    pub key: String,

    #[serde(default)]
    pub direction: SortDirection,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct QueryListingValidator {
    #[serde(default)]
    #[validate(length(max = 200, message = "search must be at most 200 characters"))]
    pub search: String,

    /// Discrete filters by name; `"all"` or blank means no constraint.
    #[serde(default)]
    pub filters: BTreeMap<String, String>,

    #[serde(default)]
    pub date_range: Option<DateRangeFilter>,

    #[serde(default)]
    pub relation: Option<RelationFilter>,

    #[serde(default)]
    pub numeric_ranges: Vec<NumericRangeFilter>,

    #[serde(default)]
    pub preset: Option<FilterPreset>,

    #[serde(default)]
    #[validate(nested)]
    pub sort: Option<SortValidator>,

    #[serde(default)]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: Option<i64>,

    #[serde(default)]
    #[validate(range(max = 1000, message = "page_size must be at most 1000"))]
    pub page_size: Option<i64>,
}

impl QueryListingValidator {
    pub fn into_listing_query(self) -> Result<ListingQuery, CoreError> {
        if let Some(range) = &self.date_range
            && range.field.trim().is_empty()
        {
            return Err(CoreError::invalid("date_range.field is required"));
        }

        let defaults = PageSpec::default();
        Ok(ListingQuery {
            filter: FilterState {
                search: self.search,
                discrete: self.filters,
                date_range: self.date_range,
                relation: self.relation,
                numeric_ranges: self.numeric_ranges,
                preset_range: None,
            },
            preset: self.preset,
            sort: self.sort.map(|sort| SortSpec {
                key: sort.key,
                direction: sort.direction,
            }),
            page: PageSpec::new(
                self.page_size.unwrap_or(defaults.page_size),
                self.page.unwrap_or(defaults.page_index),
            ),
        })
    }
}
