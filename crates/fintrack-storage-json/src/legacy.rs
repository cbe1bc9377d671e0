//! Read-boundary adapters for records written by older versions of the store.
//!
//! Legacy files use camelCase keys, a `type` discriminator, ISO datetimes
//! where dates are expected, and loan schedules stored inconsistently as an
//! array, a JSON string or a single object. Everything here is lenient and
//! never fails; the typed deserialization afterwards decides validity.

use chrono::{DateTime, NaiveDate};
use serde_json::{Map, Value};
use tracing::warn;

use fintrack_domain::AmortizationEntry;

/// Converts a persisted schedule of any historical shape into entries.
///
/// Arrays pass through, strings are parsed as JSON arrays, a single object is
/// wrapped, and anything else yields an empty schedule. Rows that cannot be
/// read are skipped.
pub fn normalize_schedule(value: &Value) -> Vec<AmortizationEntry> {
    match value {
        Value::Array(rows) => rows.iter().filter_map(schedule_row).collect(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(rows)) => rows.iter().filter_map(schedule_row).collect(),
            Ok(_) => Vec::new(),
            Err(err) => {
                warn!(error = %err, "discarding unparseable loan schedule");
                Vec::new()
            }
        },
        Value::Object(_) => schedule_row(value).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn schedule_row(value: &Value) -> Option<AmortizationEntry> {
    let upgraded = upgrade_keys(value.clone());
    match serde_json::from_value(upgraded) {
        Ok(entry) => Some(entry),
        Err(err) => {
            warn!(error = %err, "skipping malformed schedule row");
            None
        }
    }
}

/// Recursively rewrites object keys to snake_case and maps the legacy `type`
/// key to `kind`. Datetimes stored under `*date` keys are cut to dates.
/// Free-form `metadata` bags are left as they are.
pub fn upgrade_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut upgraded = Map::with_capacity(map.len());
            for (key, inner) in map {
                let key = match key.as_str() {
                    "type" => "kind".to_string(),
                    other => snake_case(other),
                };
                let inner = if key == "metadata" {
                    inner
                } else if key.ends_with("date") {
                    trim_datetime(inner)
                } else {
                    upgrade_keys(inner)
                };
                upgraded.entry(key).or_insert(inner);
            }
            Value::Object(upgraded)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(upgrade_keys).collect()),
        other => other,
    }
}

/// Moves a legacy `accountAmount` entry out of the metadata bag into the
/// typed field and stringifies the remaining metadata values.
pub fn lift_transaction_metadata(value: &mut Value) {
    let Some(record) = value.as_object_mut() else {
        return;
    };
    let metadata = match record.remove("metadata") {
        Some(Value::Object(map)) => map,
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    };
    let mut flattened = Map::new();
    for (key, inner) in metadata {
        if key == "accountAmount" || key == "account_amount" {
            if !inner.is_null() {
                record.entry("account_amount").or_insert(inner);
            }
            continue;
        }
        let text = match inner {
            Value::String(text) => text,
            Value::Null => continue,
            other => other.to_string(),
        };
        flattened.insert(key, Value::String(text));
    }
    if !flattened.is_empty() {
        record.insert("metadata".into(), Value::Object(flattened));
    }
}

fn snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn trim_datetime(value: Value) -> Value {
    let Value::String(raw) = &value else {
        return value;
    };
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return value;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Value::String(parsed.date_naive().format("%Y-%m-%d").to_string()),
        Err(_) => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> Value {
        json!({ "period": 1, "dueDate": "2025-10-10", "interest": 1, "principal": 9, "balance": 91 })
    }

    #[test]
    fn arrays_pass_through() {
        let schedule = normalize_schedule(&json!([row()]));
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].due_date, NaiveDate::from_ymd_opt(2025, 10, 10).unwrap());
    }

    #[test]
    fn json_strings_are_parsed() {
        let encoded = Value::String(json!([row(), row()]).to_string());
        assert_eq!(normalize_schedule(&encoded).len(), 2);
    }

    #[test]
    fn single_objects_are_wrapped() {
        let schedule = normalize_schedule(&row());
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].period, 1);
    }

    #[test]
    fn garbage_yields_empty_schedule() {
        assert!(normalize_schedule(&Value::String("not a json".into())).is_empty());
        assert!(normalize_schedule(&Value::String("{}".into())).is_empty());
        assert!(normalize_schedule(&Value::Null).is_empty());
        assert!(normalize_schedule(&json!(42)).is_empty());
    }

    #[test]
    fn datetimes_under_date_keys_become_dates() {
        let upgraded = upgrade_keys(json!({ "startDate": "2025-10-01T00:00:00.000Z", "termMonths": 12 }));
        assert_eq!(upgraded, json!({ "start_date": "2025-10-01", "term_months": 12 }));
    }

    #[test]
    fn account_amount_is_lifted_out_of_metadata() {
        let mut record = json!({ "metadata": { "accountAmount": 12.5, "import": "sms", "line": 3 } });
        lift_transaction_metadata(&mut record);
        assert_eq!(record["account_amount"], json!(12.5));
        assert_eq!(record["metadata"], json!({ "import": "sms", "line": "3" }));
    }
}
