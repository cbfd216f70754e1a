use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use std::collections::HashMap;
use thiserror::Error;

/// A charter party contract attached to one voyage.
///
/// Wire format is camelCase to match the existing frontend; columns are
/// snake_case in Postgres and map through `FromRow` field names.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CharterParty {
    pub id: String,
    pub voyage_id: String,
    pub cp_number: Option<String>,
    pub cp_date: Option<DateTime<Utc>>,
    pub laycan_start: Option<DateTime<Utc>>,
    pub laycan_end: Option<DateTime<Utc>>,
    pub laytime_allowed: f64,
    pub laytime_unit: Option<String>,
    pub terms: Option<String>,
    pub demurrage_rate: f64,
    pub despatch_rate: Option<f64>,
    pub despatch_percentage: Option<f64>,
    pub reversible: bool,
    pub pro_ratable: bool,
    pub shinc: bool,
    pub shex: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a charter party about to be created. The store assigns
/// `id` and `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCharterParty {
    pub voyage_id: String,
    pub cp_number: Option<String>,
    pub cp_date: Option<DateTime<Utc>>,
    pub laycan_start: Option<DateTime<Utc>>,
    pub laycan_end: Option<DateTime<Utc>>,
    pub laytime_allowed: f64,
    pub laytime_unit: Option<String>,
    pub terms: Option<String>,
    pub demurrage_rate: f64,
    pub despatch_rate: Option<f64>,
    pub despatch_percentage: Option<f64>,
    pub reversible: bool,
    pub pro_ratable: bool,
    pub shinc: bool,
    pub shex: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("invalid charter party fields: {0:?}")]
    InvalidFields(HashMap<String, String>),
}

/// Per-field coercion outcome. Keeping absent, valid, and invalid distinct is
/// what lets a bad value fail the request instead of persisting a sentinel.
enum Field<T> {
    Absent,
    Valid(T),
    Invalid(&'static str),
}

impl NewCharterParty {
    /// Coerce a loosely-typed JSON payload into a typed record.
    ///
    /// The voyage id always comes from the caller (the URL path); a voyageId
    /// inside the payload is ignored. Field problems are collected into one
    /// `InvalidFields` error rather than failing on the first.
    pub fn from_payload(voyage_id: &str, payload: &Value) -> Result<Self, PayloadError> {
        let object = payload.as_object().ok_or(PayloadError::NotAnObject)?;
        let mut errors = HashMap::new();

        let record = Self {
            voyage_id: voyage_id.to_string(),
            cp_number: optional_text(object, "cpNumber", &mut errors),
            cp_date: optional_date(object, "cpDate", &mut errors),
            laycan_start: optional_date(object, "laycanStart", &mut errors),
            laycan_end: optional_date(object, "laycanEnd", &mut errors),
            laytime_allowed: required_number(object, "laytimeAllowed", &mut errors),
            laytime_unit: optional_text(object, "laytimeUnit", &mut errors),
            terms: optional_text(object, "terms", &mut errors),
            demurrage_rate: required_number(object, "demurrageRate", &mut errors),
            despatch_rate: optional_number(object, "despatchRate", &mut errors),
            despatch_percentage: optional_number(object, "despatchPercentage", &mut errors),
            reversible: flag(object, "reversible"),
            pro_ratable: flag(object, "proRatable"),
            shinc: flag(object, "shinc"),
            shex: flag(object, "shex"),
            notes: optional_text(object, "notes", &mut errors),
        };

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(PayloadError::InvalidFields(errors))
        }
    }
}

/// Required numeric field: missing, null, or unparsable input rejects the
/// request. Returns a placeholder on error; the caller never uses it because
/// a non-empty error map fails the whole payload.
fn required_number(
    object: &Map<String, Value>,
    field: &'static str,
    errors: &mut HashMap<String, String>,
) -> f64 {
    let outcome = object.get(field).map(number_field).unwrap_or(Field::Absent);
    match outcome {
        Field::Valid(n) => n,
        Field::Absent => {
            errors.insert(field.to_string(), "is required and must be a number".to_string());
            0.0
        }
        Field::Invalid(reason) => {
            errors.insert(field.to_string(), reason.to_string());
            0.0
        }
    }
}

/// Optional numeric field: falsy input (absent, null, false, 0, "") is an
/// explicit absent, matching the frontend's `x ? parse(x) : null` contract.
fn optional_number(
    object: &Map<String, Value>,
    field: &'static str,
    errors: &mut HashMap<String, String>,
) -> Option<f64> {
    let value = object.get(field)?;
    if !truthy(value) {
        return None;
    }
    match number_field(value) {
        Field::Valid(n) => Some(n),
        Field::Absent => None,
        Field::Invalid(reason) => {
            errors.insert(field.to_string(), reason.to_string());
            None
        }
    }
}

fn optional_date(
    object: &Map<String, Value>,
    field: &'static str,
    errors: &mut HashMap<String, String>,
) -> Option<DateTime<Utc>> {
    match object.get(field).map(date_field)? {
        Field::Valid(d) => Some(d),
        Field::Absent => None,
        Field::Invalid(reason) => {
            errors.insert(field.to_string(), reason.to_string());
            None
        }
    }
}

fn optional_text(
    object: &Map<String, Value>,
    field: &'static str,
    errors: &mut HashMap<String, String>,
) -> Option<String> {
    match object.get(field).map(text_field)? {
        Field::Valid(s) => Some(s),
        Field::Absent => None,
        Field::Invalid(reason) => {
            errors.insert(field.to_string(), reason.to_string());
            None
        }
    }
}

/// Boolean flags follow JS truthiness: absent/falsy coerces to false,
/// anything truthy to true.
fn flag(object: &Map<String, Value>, field: &str) -> bool {
    object.get(field).map(truthy).unwrap_or(false)
}

fn number_field(value: &Value) -> Field<f64> {
    match value {
        Value::Null => Field::Absent,
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.is_finite() => Field::Valid(f),
            _ => Field::Invalid("must be a finite number"),
        },
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Field::Absent;
            }
            match trimmed.parse::<f64>() {
                Ok(f) if f.is_finite() => Field::Valid(f),
                _ => Field::Invalid("must be a number"),
            }
        }
        _ => Field::Invalid("must be a number"),
    }
}

/// Dates arrive as RFC 3339 timestamps or plain `YYYY-MM-DD` (stored at
/// midnight UTC). Empty strings count as absent; anything else unparsable is
/// an error, never a placeholder date.
fn date_field(value: &Value) -> Field<DateTime<Utc>> {
    match value {
        Value::Null => Field::Absent,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Field::Absent;
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
                return Field::Valid(dt.with_timezone(&Utc));
            }
            match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                Ok(date) => match date.and_hms_opt(0, 0, 0) {
                    Some(naive) => Field::Valid(DateTime::from_naive_utc_and_offset(naive, Utc)),
                    None => Field::Invalid("must be an ISO 8601 date"),
                },
                Err(_) => Field::Invalid("must be an ISO 8601 date"),
            }
        }
        _ => Field::Invalid("must be an ISO 8601 date"),
    }
}

fn text_field(value: &Value) -> Field<String> {
    match value {
        Value::Null => Field::Absent,
        Value::String(s) => Field::Valid(s.clone()),
        _ => Field::Invalid("must be a string"),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(payload: Value) -> Result<NewCharterParty, PayloadError> {
        NewCharterParty::from_payload("voyage-1", &payload)
    }

    #[test]
    fn coerces_a_full_payload() {
        let record = parse(json!({
            "cpNumber": "CP-2024-001",
            "cpDate": "2024-03-01",
            "laycanStart": "2024-03-10T06:00:00Z",
            "laycanEnd": "2024-03-15",
            "laytimeAllowed": "72",
            "laytimeUnit": "hours",
            "terms": "SHINC",
            "demurrageRate": 15000.5,
            "despatchRate": "7500.25",
            "despatchPercentage": 50,
            "reversible": true,
            "shinc": 1,
            "notes": "as per recap"
        }))
        .unwrap();

        assert_eq!(record.voyage_id, "voyage-1");
        assert_eq!(record.cp_number.as_deref(), Some("CP-2024-001"));
        assert_eq!(record.laytime_allowed, 72.0);
        assert_eq!(record.demurrage_rate, 15000.5);
        assert_eq!(record.despatch_rate, Some(7500.25));
        assert_eq!(record.despatch_percentage, Some(50.0));
        assert_eq!(
            record.cp_date.unwrap().to_rfc3339(),
            "2024-03-01T00:00:00+00:00"
        );
        assert!(record.reversible);
        assert!(record.shinc);
        assert!(!record.shex);
        assert!(!record.pro_ratable);
    }

    #[test]
    fn body_voyage_id_is_ignored() {
        let record = parse(json!({
            "voyageId": "someone-elses-voyage",
            "laytimeAllowed": 24,
            "demurrageRate": 1000
        }))
        .unwrap();

        assert_eq!(record.voyage_id, "voyage-1");
    }

    #[test]
    fn rejects_missing_required_numbers() {
        let err = parse(json!({ "cpNumber": "CP-1" })).unwrap_err();
        match err {
            PayloadError::InvalidFields(fields) => {
                assert!(fields.contains_key("laytimeAllowed"));
                assert!(fields.contains_key("demurrageRate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_non_numeric_required_fields() {
        let err = parse(json!({
            "laytimeAllowed": "abc",
            "demurrageRate": 1000
        }))
        .unwrap_err();

        match err {
            PayloadError::InvalidFields(fields) => {
                assert!(fields.contains_key("laytimeAllowed"));
                assert!(!fields.contains_key("demurrageRate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn falsy_optional_numbers_are_absent() {
        for despatch in [json!(null), json!(0), json!(""), json!(false)] {
            let record = parse(json!({
                "laytimeAllowed": 24,
                "demurrageRate": 1000,
                "despatchRate": despatch
            }))
            .unwrap();
            assert_eq!(record.despatch_rate, None);
        }
    }

    #[test]
    fn invalid_optional_number_is_an_error_not_a_sentinel() {
        let err = parse(json!({
            "laytimeAllowed": 24,
            "demurrageRate": 1000,
            "despatchRate": "half"
        }))
        .unwrap_err();

        match err {
            PayloadError::InvalidFields(fields) => {
                assert!(fields.contains_key("despatchRate"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_date_strings_are_absent_and_garbage_rejected() {
        let record = parse(json!({
            "laytimeAllowed": 24,
            "demurrageRate": 1000,
            "cpDate": ""
        }))
        .unwrap();
        assert_eq!(record.cp_date, None);

        let err = parse(json!({
            "laytimeAllowed": 24,
            "demurrageRate": 1000,
            "cpDate": "next tuesday"
        }))
        .unwrap_err();
        match err {
            PayloadError::InvalidFields(fields) => assert!(fields.contains_key("cpDate")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn flags_follow_truthiness() {
        let record = parse(json!({
            "laytimeAllowed": 24,
            "demurrageRate": 1000,
            "reversible": "yes",
            "proRatable": 0,
            "shex": false
        }))
        .unwrap();

        assert!(record.reversible);
        assert!(!record.pro_ratable);
        assert!(!record.shinc);
        assert!(!record.shex);
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(matches!(
            parse(json!([1, 2, 3])),
            Err(PayloadError::NotAnObject)
        ));
    }
}
