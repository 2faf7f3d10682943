use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::domain::common::entities::app_errors::CoreError;

static NULL: Value = Value::Null;

/// Walks a dotted path (`manager.email`, `_count.users`, `items.0.id`).
/// Anything that cannot be followed reads as `null`.
pub fn lookup<'a>(root: &'a Value, path: &str) -> &'a Value {
    if path.is_empty() {
        return root;
    }

    let mut current = root;
    for segment in path.split('.') {
        current = match current {
            Value::Object(map) => match map.get(segment) {
                Some(value) => value,
                None => return &NULL,
            },
            Value::Array(items) => match segment.parse::<usize>().ok().and_then(|i| items.get(i)) {
                Some(value) => value,
                None => return &NULL,
            },
            _ => return &NULL,
        };
    }
    current
}

/// Textual form used for search and equality filters.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric view of a value. Decimal amounts often arrive as strings.
pub fn value_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

pub fn value_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp(s),
        Value::Number(n) => n
            .as_i64()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
        _ => None,
    }
}

/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (read as UTC) or a
/// bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    parse_date(raw).map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Which end of an inclusive range a bound closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Lower,
    Upper,
}

/// Parses a date-range bound. A bare date used as an upper bound covers the
/// whole day.
pub fn parse_date_bound(raw: &str, side: BoundSide) -> Result<DateTime<Utc>, CoreError> {
    let trimmed = raw.trim();
    if side == BoundSide::Upper
        && let Some(date) = parse_date(trimmed)
    {
        let end_of_day = date
            .succ_opt()
            .map(|next| next.and_time(NaiveTime::MIN).and_utc() - chrono::Duration::milliseconds(1))
            .ok_or_else(|| CoreError::invalid(format!("date bound out of range: '{}'", raw)))?;
        return Ok(end_of_day);
    }

    parse_timestamp(trimmed)
        .ok_or_else(|| CoreError::invalid(format!("malformed date bound: '{}'", raw)))
}

pub fn parse_number_bound(raw: &str) -> Result<f64, CoreError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| CoreError::invalid(format!("malformed numeric bound: '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_nested_and_missing() {
        let value = json!({"manager": {"email": "a@b.c"}, "tags": [{"id": 7}]});
        assert_eq!(lookup(&value, "manager.email"), &json!("a@b.c"));
        assert_eq!(lookup(&value, "tags.0.id"), &json!(7));
        assert!(lookup(&value, "manager.phone").is_null());
        assert!(lookup(&value, "manager.email.domain").is_null());
    }

    #[test]
    fn test_number_from_decimal_string() {
        assert_eq!(value_number(&json!("5000.50")), Some(5000.5));
        assert_eq!(value_number(&json!(true)), Some(1.0));
        assert_eq!(value_number(&json!("n/a")), None);
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-15T10:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-15T10:30:00.000"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-01-15"),
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("not a date"), None);
    }

    #[test]
    fn test_upper_date_bound_covers_whole_day() {
        let bound = parse_date_bound("2024-01-31", BoundSide::Upper).unwrap();
        let late = parse_timestamp("2024-01-31T23:59:59Z").unwrap();
        let next = parse_timestamp("2024-02-01T00:00:00Z").unwrap();
        assert!(late <= bound);
        assert!(next > bound);
    }

    #[test]
    fn test_malformed_bounds_are_rejected() {
        assert!(matches!(
            parse_date_bound("31/01/2024", BoundSide::Lower),
            Err(CoreError::InvalidArgument(_))
        ));
        assert!(parse_number_bound("abc").is_err());
    }
}
