use std::cmp::Ordering;

use serde_json::Value;

use crate::domain::{
    common::entities::app_errors::CoreError,
    listing::{
        entities::{FilteredResult, Record},
        helpers::{value_number, value_text, value_timestamp},
        predicate::CompositePredicate,
        schema::{ListingSchema, SortKey, SortKind},
        value_objects::{FilterState, PageSpec, SortDirection, SortSpec},
    },
};

/// Sort key extracted once per record before sorting.
#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Text(String),
    Number(f64),
    Date(i64),
}

impl SortValue {
    fn extract(record: &Record, key: &SortKey) -> Self {
        let value = record.get(&key.path);
        match key.kind {
            SortKind::Text => {
                SortValue::Text(value_text(value).unwrap_or_default().to_lowercase())
            }
            SortKind::Number => SortValue::Number(value_number(value).unwrap_or(0.0)),
            SortKind::Date => SortValue::Date(
                value_timestamp(value)
                    .map(|date| date.timestamp_millis())
                    .unwrap_or(i64::MIN),
            ),
            SortKind::Count => SortValue::Number(match value {
                Value::Array(items) => items.len() as f64,
                other => value_number(other).unwrap_or(0.0),
            }),
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Date(a), SortValue::Date(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Filter, sort and paginate engine for one list page.
#[derive(Debug, Clone)]
pub struct ListingEngine {
    schema: ListingSchema,
}

impl ListingEngine {
    pub fn new(schema: ListingSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &ListingSchema {
        &self.schema
    }

    /// Records passing `filter`, in input order.
    pub fn filtered<'a>(
        &self,
        records: &'a [Record],
        filter: &FilterState,
    ) -> Result<Vec<&'a Record>, CoreError> {
        let predicate = CompositePredicate::build(&self.schema, filter)?;
        Ok(records
            .iter()
            .filter(|record| predicate.matches(record))
            .collect())
    }

    pub fn query(
        &self,
        records: &[Record],
        filter: &FilterState,
        sort: &SortSpec,
        page: &PageSpec,
    ) -> Result<FilteredResult, CoreError> {
        page.validate()?;

        let sort_key = self.schema.resolve_sort_key(&sort.key).ok_or_else(|| {
            CoreError::invalid(format!(
                "unknown sort key '{}' for {}",
                sort.key, self.schema.name
            ))
        })?;

        let mut decorated: Vec<(SortValue, &Record)> = self
            .filtered(records, filter)?
            .into_iter()
            .map(|record| (SortValue::extract(record, sort_key), record))
            .collect();

        // slice::sort_by is stable; descending flips the comparison so ties
        // keep their input order.
        decorated.sort_by(|(a, _), (b, _)| match sort.direction {
            SortDirection::Asc => a.compare(b),
            SortDirection::Desc => a.compare(b).reverse(),
        });

        let total_filtered = decorated.len();
        let page_index = page.clamped_index(total_filtered);

        let visible = decorated
            .into_iter()
            .skip(page.offset(total_filtered))
            .take(usize::try_from(page.page_size).unwrap_or(usize::MAX))
            .map(|(_, record)| record.clone())
            .collect();

        Ok(FilteredResult {
            visible,
            total_filtered,
            total_unfiltered: records.len(),
            page_index,
            page_size: page.page_size,
            total_pages: page.total_pages(total_filtered),
        })
    }
}

pub fn query(
    schema: &ListingSchema,
    records: &[Record],
    filter: &FilterState,
    sort: &SortSpec,
    page: &PageSpec,
) -> Result<FilteredResult, CoreError> {
    ListingEngine::new(schema.clone()).query(records, filter, sort, page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> Vec<Record> {
        [
            json!({"id": 1, "name": "Alpha", "role": "ADMIN", "active": true}),
            json!({"id": 2, "name": "Beta", "role": "CREDIT_OFFICER", "active": false}),
            json!({"id": 3, "name": "beta2", "role": "CREDIT_OFFICER", "active": true}),
        ]
        .into_iter()
        .filter_map(Record::from_value)
        .collect()
    }

    fn people_schema() -> ListingSchema {
        ListingSchema::new("people")
            .searchable(&["name"])
            .filter("role", "role")
            .flag_filter("status", "active")
            .sort_field("name", SortKind::Text)
            .sort_field("role", SortKind::Text)
            .sort_field("id", SortKind::Number)
            .sort_field("createdAt", SortKind::Date)
            .sort_key("branches", "branches", SortKind::Count)
    }

    fn ids(result: &FilteredResult) -> Vec<String> {
        result.visible.iter().filter_map(Record::id).collect()
    }

    fn engine() -> ListingEngine {
        ListingEngine::new(people_schema())
    }

    #[test]
    fn test_search_with_status_filter() {
        let filter = FilterState::new()
            .with_search("beta")
            .with_discrete("role", "all")
            .with_discrete("status", "active");
        let result = engine()
            .query(&people(), &filter, &SortSpec::asc("name"), &PageSpec::default())
            .unwrap();

        assert_eq!(ids(&result), vec!["3"]);
        assert_eq!(result.total_filtered, 1);
        assert_eq!(result.total_unfiltered, 3);
    }

    #[test]
    fn test_first_page_sorted_by_name() {
        let result = engine()
            .query(
                &people(),
                &FilterState::new(),
                &SortSpec::asc("name"),
                &PageSpec::new(2, 1),
            )
            .unwrap();

        assert_eq!(ids(&result), vec!["1", "2"]);
        assert_eq!(result.total_pages, 2);
    }

    #[test]
    fn test_page_index_past_the_end_is_clamped() {
        let result = engine()
            .query(
                &people(),
                &FilterState::new(),
                &SortSpec::asc("name"),
                &PageSpec::new(10, 5),
            )
            .unwrap();

        assert_eq!(result.page_index, 1);
        assert_eq!(ids(&result), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_huge_page_size_returns_everything() {
        let result = engine()
            .query(
                &people(),
                &FilterState::new(),
                &SortSpec::asc("name"),
                &PageSpec::new(i64::MAX, 1),
            )
            .unwrap();

        assert_eq!(ids(&result), vec!["1", "2", "3"]);
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.page_index, 1);
    }

    #[test]
    fn test_narrowing_filter_returns_last_valid_page() {
        let records: Vec<Record> = (1..=25)
            .filter_map(|i| {
                Record::from_value(json!({"id": i, "name": format!("n{:02}", i), "role": if i % 5 == 0 { "ADMIN" } else { "CREDIT_OFFICER" }}))
            })
            .collect();
        let filter = FilterState::new().with_discrete("role", "ADMIN");
        let result = engine()
            .query(&records, &filter, &SortSpec::asc("name"), &PageSpec::new(2, 3))
            .unwrap();

        // five admins, two per page: page 3 holds the last one
        assert_eq!(result.page_index, 3);
        assert_eq!(ids(&result), vec!["25"]);

        let result = engine()
            .query(&records, &filter, &SortSpec::asc("name"), &PageSpec::new(2, 9))
            .unwrap();
        assert_eq!(result.page_index, 3);
        assert!(!result.visible.is_empty());
    }

    #[test]
    fn test_empty_input_never_fails() {
        let result = engine()
            .query(
                &[],
                &FilterState::new().with_search("anything"),
                &SortSpec::desc("name"),
                &PageSpec::new(10, 1),
            )
            .unwrap();

        assert!(result.visible.is_empty());
        assert_eq!(result.total_filtered, 0);
        assert_eq!(result.total_unfiltered, 0);
        assert_eq!(result.page_index, 1);
    }

    #[test]
    fn test_zero_page_size_is_invalid() {
        let err = engine()
            .query(
                &people(),
                &FilterState::new(),
                &SortSpec::asc("name"),
                &PageSpec::new(0, 1),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));

        let err = engine()
            .query(&[], &FilterState::new(), &SortSpec::asc("name"), &PageSpec::new(-1, 1))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_unknown_sort_key_is_invalid() {
        let err = engine()
            .query(
                &people(),
                &FilterState::new(),
                &SortSpec::asc("salary"),
                &PageSpec::default(),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
    }

    #[test]
    fn test_stable_under_ties_in_both_directions() {
        let records = people();
        for sort in [SortSpec::asc("role"), SortSpec::desc("role")] {
            let result = engine()
                .query(&records, &FilterState::new(), &sort, &PageSpec::default())
                .unwrap();
            let officers: Vec<String> = result
                .visible
                .iter()
                .filter(|r| r.text("role") == "CREDIT_OFFICER")
                .filter_map(Record::id)
                .collect();
            assert_eq!(officers, vec!["2", "3"], "{:?}", sort.direction);
        }

        let desc = engine()
            .query(&records, &FilterState::new(), &SortSpec::desc("role"), &PageSpec::default())
            .unwrap();
        assert_eq!(ids(&desc), vec!["2", "3", "1"]);
    }

    #[test]
    fn test_dates_sort_with_unparseable_first() {
        let records: Vec<Record> = [
            json!({"id": "a", "createdAt": "2024-03-01T00:00:00Z"}),
            json!({"id": "b", "createdAt": "not a date"}),
            json!({"id": "c", "createdAt": "2023-12-31"}),
            json!({"id": "d"}),
        ]
        .into_iter()
        .filter_map(Record::from_value)
        .collect();

        let result = engine()
            .query(&records, &FilterState::new(), &SortSpec::asc("createdAt"), &PageSpec::default())
            .unwrap();
        assert_eq!(ids(&result), vec!["b", "d", "c", "a"]);
    }

    #[test]
    fn test_numbers_and_counts_sort_numerically() {
        let records: Vec<Record> = [
            json!({"id": 10, "branches": [1, 2]}),
            json!({"id": 9, "branches": 5}),
            json!({"id": 100}),
        ]
        .into_iter()
        .filter_map(Record::from_value)
        .collect();

        let by_id = engine()
            .query(&records, &FilterState::new(), &SortSpec::asc("id"), &PageSpec::default())
            .unwrap();
        assert_eq!(ids(&by_id), vec!["9", "10", "100"]);

        let by_count = engine()
            .query(&records, &FilterState::new(), &SortSpec::desc("branches"), &PageSpec::default())
            .unwrap();
        assert_eq!(ids(&by_count), vec!["9", "10", "100"]);
    }

    #[test]
    fn test_query_is_idempotent_and_does_not_mutate_input() {
        let records = people();
        let snapshot = records.clone();
        let filter = FilterState::new().with_discrete("role", "CREDIT_OFFICER");
        let sort = SortSpec::desc("name");
        let page = PageSpec::new(1, 2);

        let first = engine().query(&records, &filter, &sort, &page).unwrap();
        let second = engine().query(&records, &filter, &sort, &page).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(records, snapshot);
    }

    #[test]
    fn test_pages_concatenate_to_full_list() {
        let records: Vec<Record> = (0..23)
            .filter_map(|i| Record::from_value(json!({"id": i, "name": format!("p{}", i % 7)})))
            .collect();
        let sort = SortSpec::asc("name");
        let everything = engine()
            .query(&records, &FilterState::new(), &sort, &PageSpec::new(100, 1))
            .unwrap();

        let page_size = 4;
        let total_pages = everything.total_filtered.div_ceil(page_size);
        let mut stitched = Vec::new();
        for page_index in 1..=total_pages {
            let page = engine()
                .query(
                    &records,
                    &FilterState::new(),
                    &sort,
                    &PageSpec::new(page_size as i64, page_index as i64),
                )
                .unwrap();
            stitched.extend(page.visible);
        }

        assert_eq!(stitched, everything.visible);
    }

    #[test]
    fn test_additional_constraint_never_grows_the_result() {
        let records = people();
        let base = FilterState::new().with_discrete("role", "CREDIT_OFFICER");
        let narrower = base.clone().with_discrete("status", "active");
        let sort = SortSpec::asc("name");

        let wide = engine()
            .query(&records, &base, &sort, &PageSpec::default())
            .unwrap();
        let narrow = engine()
            .query(&records, &narrower, &sort, &PageSpec::default())
            .unwrap();

        assert!(narrow.total_filtered <= wide.total_filtered);
        assert_eq!((wide.total_filtered, narrow.total_filtered), (2, 1));
    }

    #[test]
    fn test_all_sentinels_keep_every_record() {
        let filter = FilterState::new()
            .with_search("")
            .with_discrete("role", "all")
            .with_discrete("status", "all")
            .with_relation("branchId", "all");
        let result = engine()
            .query(&people(), &filter, &SortSpec::asc("name"), &PageSpec::default())
            .unwrap();
        let unfiltered = engine()
            .query(&people(), &FilterState::new(), &SortSpec::asc("name"), &PageSpec::default())
            .unwrap();

        assert_eq!(result.total_filtered, result.total_unfiltered);
        assert_eq!(result.visible, unfiltered.visible);
    }

    #[test]
    fn test_free_function_matches_engine() {
        let schema = people_schema();
        let result = query(
            &schema,
            &people(),
            &FilterState::new(),
            &SortSpec::desc("name"),
            &PageSpec::new(1, 1),
        )
        .unwrap();
        assert_eq!(ids(&result), vec!["3"]);
    }
}
