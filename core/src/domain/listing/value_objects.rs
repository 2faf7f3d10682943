use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::common::entities::app_errors::CoreError;

pub const ALL_SENTINEL: &str = "all";

/// `"all"` or a blank value means "no constraint".
pub fn is_sentinel(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case(ALL_SENTINEL)
}

fn has_bound(bound: &Option<String>) -> bool {
    bound.as_deref().is_some_and(|b| !b.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DateRangeFilter {
    pub field: String,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
}

impl DateRangeFilter {
    pub fn is_active(&self) -> bool {
        has_bound(&self.from) || has_bound(&self.to)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RelationFilter {
    pub field: String,
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NumericRangeFilter {
    pub field: String,
    #[serde(default)]
    pub min: Option<String>,
    #[serde(default)]
    pub max: Option<String>,
}

impl NumericRangeFilter {
    pub fn is_active(&self) -> bool {
        has_bound(&self.min) || has_bound(&self.max)
    }
}

/// Everything the filter controls of a list page hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FilterState {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub discrete: BTreeMap<String, String>,
    #[serde(default)]
    pub date_range: Option<DateRangeFilter>,
    #[serde(default)]
    pub relation: Option<RelationFilter>,
    #[serde(default)]
    pub numeric_ranges: Vec<NumericRangeFilter>,
    /// Quick date filter, ANDed with `date_range`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset_range: Option<DateRangeFilter>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    pub fn with_discrete(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.discrete.insert(name.into(), value.into());
        self
    }

    pub fn with_date_range(
        mut self,
        field: impl Into<String>,
        from: Option<String>,
        to: Option<String>,
    ) -> Self {
        self.date_range = Some(DateRangeFilter {
            field: field.into(),
            from,
            to,
        });
        self
    }

    pub fn with_preset_range(
        mut self,
        field: impl Into<String>,
        from: Option<String>,
        to: Option<String>,
    ) -> Self {
        self.preset_range = Some(DateRangeFilter {
            field: field.into(),
            from,
            to,
        });
        self
    }

    pub fn with_relation(mut self, field: impl Into<String>, target_id: impl Into<String>) -> Self {
        self.relation = Some(RelationFilter {
            field: field.into(),
            target_id: target_id.into(),
        });
        self
    }

    pub fn with_numeric_range(
        mut self,
        field: impl Into<String>,
        min: Option<String>,
        max: Option<String>,
    ) -> Self {
        self.numeric_ranges.push(NumericRangeFilter {
            field: field.into(),
            min,
            max,
        });
        self
    }

    /// Number of constraints that actually narrow the list.
    pub fn active_filter_count(&self) -> usize {
        let search = usize::from(!self.search.trim().is_empty());
        let discrete = self.discrete.values().filter(|v| !is_sentinel(v)).count();
        let date = usize::from(self.date_range.as_ref().is_some_and(|r| r.is_active()));
        let relation = usize::from(
            self.relation
                .as_ref()
                .is_some_and(|r| !is_sentinel(&r.target_id)),
        );
        let numeric = self.numeric_ranges.iter().filter(|r| r.is_active()).count();
        let preset = usize::from(self.preset_range.as_ref().is_some_and(|r| r.is_active()));

        search + discrete + date + relation + numeric + preset
    }

    pub fn is_empty(&self) -> bool {
        self.active_filter_count() == 0
    }

    /// The "clear filters" action.
    pub fn cleared(&self) -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SortSpec {
    pub key: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            direction: SortDirection::Desc,
        }
    }

    /// Parses `"name"` or `"-createdAt"`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.strip_prefix('-') {
            Some(key) if !key.is_empty() => Some(Self::desc(key)),
            Some(_) => None,
            None if !raw.is_empty() => Some(Self::asc(raw)),
            None => None,
        }
    }

    pub fn toggled(&self) -> Self {
        Self {
            key: self.key.clone(),
            direction: match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PageSpec {
    pub page_size: i64,
    pub page_index: i64,
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            page_size: 20,
            page_index: 1,
        }
    }
}

impl PageSpec {
    pub fn new(page_size: i64, page_index: i64) -> Self {
        Self {
            page_size,
            page_index,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.page_size <= 0 {
            return Err(CoreError::invalid(format!(
                "page_size must be positive, got {}",
                self.page_size
            )));
        }
        Ok(())
    }

    pub fn total_pages(&self, total: usize) -> i64 {
        if self.page_size <= 0 {
            return 1;
        }
        let pages = total.div_ceil(self.page_size as usize);
        i64::try_from(pages).unwrap_or(i64::MAX).max(1)
    }

    /// Offset of the first record on the clamped page.
    pub fn offset(&self, total: usize) -> usize {
        let skipped = (self.clamped_index(total) - 1).saturating_mul(self.page_size.max(0));
        usize::try_from(skipped).unwrap_or(usize::MAX)
    }

    /// Page index forced into `[1, total_pages]`.
    pub fn clamped_index(&self, total: usize) -> i64 {
        self.page_index.clamp(1, self.total_pages(total))
    }
}

/// Quick date filters offered next to the date pickers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FilterPreset {
    Today,
    ThisWeek,
    ThisMonth,
}

impl FilterPreset {
    pub const ALL: [FilterPreset; 3] = [
        FilterPreset::Today,
        FilterPreset::ThisWeek,
        FilterPreset::ThisMonth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterPreset::Today => "today",
            FilterPreset::ThisWeek => "this_week",
            FilterPreset::ThisMonth => "this_month",
        }
    }

    /// Inclusive date span relative to `today`.
    pub fn range(&self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        match self {
            FilterPreset::Today => (today, today),
            FilterPreset::ThisWeek => (today.checked_sub_days(Days::new(7)).unwrap_or(today), today),
            FilterPreset::ThisMonth => (
                today.checked_sub_days(Days::new(30)).unwrap_or(today),
                today,
            ),
        }
    }

    pub fn apply(&self, state: FilterState, field: &str, today: NaiveDate) -> FilterState {
        let (from, to) = self.range(today);
        state.with_preset_range(
            field,
            Some(from.format("%Y-%m-%d").to_string()),
            Some(to.format("%Y-%m-%d").to_string()),
        )
    }
}

impl fmt::Display for FilterPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterPreset {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Ok(FilterPreset::Today),
            "this_week" | "week" => Ok(FilterPreset::ThisWeek),
            "this_month" | "month" => Ok(FilterPreset::ThisMonth),
            other => Err(CoreError::invalid(format!("unknown filter preset '{}'", other))),
        }
    }
}

/// One list request: filters, an optional quick date preset, sort and page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ListingQuery {
    #[serde(default)]
    pub filter: FilterState,
    #[serde(default)]
    pub preset: Option<FilterPreset>,
    #[serde(default)]
    pub sort: Option<SortSpec>,
    #[serde(default)]
    pub page: PageSpec,
}

impl ListingQuery {
    /// The filter with the preset expanded into a date range on `date_field`.
    /// Both the preset and an explicit date range must hold.
    pub fn effective_filter(&self, date_field: &str, today: NaiveDate) -> FilterState {
        match self.preset {
            Some(preset) => preset.apply(self.filter.clone(), date_field, today),
            None => self.filter.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert!(is_sentinel("all"));
        assert!(is_sentinel("ALL"));
        assert!(is_sentinel("   "));
        assert!(!is_sentinel("ADMIN"));
    }

    #[test]
    fn test_active_filter_count_ignores_sentinels() {
        let state = FilterState::new()
            .with_search("  ")
            .with_discrete("role", "all")
            .with_discrete("status", "active")
            .with_relation("branchId", "all")
            .with_date_range("createdAt", Some("2024-01-01".into()), None)
            .with_numeric_range("principalAmount", None, None);

        assert_eq!(state.active_filter_count(), 2);
        assert!(state.cleared().is_empty());
    }

    #[test]
    fn test_sort_parse() {
        assert_eq!(SortSpec::parse("-createdAt"), Some(SortSpec::desc("createdAt")));
        assert_eq!(SortSpec::parse("name"), Some(SortSpec::asc("name")));
        assert_eq!(SortSpec::parse("-"), None);
        assert_eq!(SortSpec::parse(""), None);
        assert_eq!(SortSpec::asc("name").toggled(), SortSpec::desc("name"));
    }

    #[test]
    fn test_page_clamping() {
        let page = PageSpec::new(10, 5);
        assert_eq!(page.total_pages(3), 1);
        assert_eq!(page.clamped_index(3), 1);
        assert_eq!(page.clamped_index(0), 1);
        assert_eq!(PageSpec::new(2, 0).clamped_index(5), 1);
        assert_eq!(PageSpec::new(2, 3).clamped_index(5), 3);
        assert!(PageSpec::new(0, 1).validate().is_err());
        assert!(PageSpec::new(-3, 1).validate().is_err());
        assert_eq!(PageSpec::new(2, 3).offset(5), 4);
        assert_eq!(PageSpec::new(2, 9).offset(5), 4);
    }

    #[test]
    fn test_huge_page_size_does_not_overflow() {
        let page = PageSpec::new(i64::MAX, 1);
        assert_eq!(page.total_pages(3), 1);
        assert_eq!(page.clamped_index(3), 1);
        assert_eq!(page.offset(3), 0);
        assert!(PageSpec::new(i64::MAX, i64::MAX).offset(usize::MAX) > 0);
    }

    #[test]
    fn test_presets() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        assert_eq!(FilterPreset::Today.range(today), (today, today));
        assert_eq!(
            FilterPreset::ThisWeek.range(today).0,
            NaiveDate::from_ymd_opt(2024, 3, 13).unwrap()
        );
        assert_eq!(
            FilterPreset::ThisMonth.range(today).0,
            NaiveDate::from_ymd_opt(2024, 2, 19).unwrap()
        );

        let first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(
            FilterPreset::ThisMonth.range(first),
            (NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(), first)
        );

        let state = FilterPreset::ThisMonth.apply(FilterState::new(), "createdAt", today);
        assert!(state.date_range.is_none());
        let range = state.preset_range.unwrap();
        assert_eq!(range.from.as_deref(), Some("2024-02-19"));
        assert_eq!(range.to.as_deref(), Some("2024-03-20"));

        assert_eq!("week".parse::<FilterPreset>().unwrap(), FilterPreset::ThisWeek);
        assert!("yesterday".parse::<FilterPreset>().is_err());
    }

    #[test]
    fn test_preset_and_explicit_date_range_both_apply() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        let mut query = ListingQuery {
            preset: Some(FilterPreset::Today),
            ..ListingQuery::default()
        };
        let filter = query.effective_filter("createdAt", today);
        assert_eq!(filter.preset_range.unwrap().from.as_deref(), Some("2024-03-20"));
        assert!(filter.date_range.is_none());

        query.filter = query
            .filter
            .with_date_range("createdAt", Some("2023-01-01".into()), None);
        let filter = query.effective_filter("createdAt", today);
        let explicit = filter.date_range.as_ref().unwrap();
        let preset = filter.preset_range.as_ref().unwrap();
        assert_eq!(explicit.from.as_deref(), Some("2023-01-01"));
        assert_eq!(preset.from.as_deref(), Some("2024-03-20"));
        assert_eq!(filter.active_filter_count(), 2);
    }
}
