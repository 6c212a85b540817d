use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::QueryError;

use super::length::DEFAULT_LEN;
use super::parse::parse_query_string;
use super::types::{DistinctRequest, LengthIntent, QueryRequest};

/// Inbound request exactly as a transport hands it over, before validation.
///
/// Every field is kept as a raw JSON value so that shape errors map onto the
/// dedicated error kinds instead of a generic deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRequest {
    #[serde(default)]
    pub query: Option<Value>,
    #[serde(default)]
    pub len: Option<Value>,
    #[serde(default)]
    pub distinct: Option<Value>,
}

impl RawRequest {
    #[must_use]
    pub fn new(query: &str, len: i64, distinct: Option<Vec<String>>) -> Self {
        Self {
            query: Some(Value::String(query.to_string())),
            len: Some(Value::from(len)),
            distinct: distinct.map(|d| Value::Array(d.into_iter().map(Value::String).collect())),
        }
    }

    /// # Errors
    /// Returns [`QueryError::InvalidRequest`] if the line is not a JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, QueryError> {
        let v: Value =
            serde_json::from_str(json).map_err(|e| QueryError::InvalidRequest(e.to_string()))?;
        if !v.is_object() {
            return Err(QueryError::InvalidRequest("request must be a JSON object".into()));
        }
        serde_json::from_value(v).map_err(|e| QueryError::InvalidRequest(e.to_string()))
    }
}

impl TryFrom<RawRequest> for QueryRequest {
    type Error = QueryError;
    fn try_from(raw: RawRequest) -> Result<Self, Self::Error> {
        let query = query_text(raw.query.as_ref())?;
        let filter = parse_query_string(query)?;
        let length = LengthIntent::from_len(len_value(raw.len.as_ref())?)?;
        let distinct = distinct_fields(raw.distinct.as_ref())?;
        Ok(Self { filter, length, distinct })
    }
}

fn query_text(v: Option<&Value>) -> Result<&str, QueryError> {
    match v {
        None | Some(Value::Null) => Ok(""),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Array(_) | Value::Object(_)) => {
            Err(QueryError::InvalidRequest("accepts only a single query".into()))
        }
        Some(other) => Err(QueryError::InvalidRequest(format!("query must be a string, got {other}"))),
    }
}

fn len_value(v: Option<&Value>) -> Result<i64, QueryError> {
    match v {
        None | Some(Value::Null) => Ok(DEFAULT_LEN),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| QueryError::InvalidLength(n.to_string())),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(DEFAULT_LEN),
        Some(Value::String(s)) => {
            s.trim().parse::<i64>().map_err(|_| QueryError::InvalidLength(format!("'{s}'")))
        }
        Some(other) => Err(QueryError::InvalidLength(other.to_string())),
    }
}

fn distinct_fields(v: Option<&Value>) -> Result<DistinctRequest, QueryError> {
    match v {
        None | Some(Value::Null) => Ok(DistinctRequest::default()),
        Some(Value::String(s)) => Ok(DistinctRequest::from_specifiers([s.as_str()])),
        Some(Value::Array(items)) => {
            let names = items
                .iter()
                .map(|i| i.as_str().ok_or(QueryError::InvalidDistinctShape))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(DistinctRequest::from_specifiers(names))
        }
        Some(_) => Err(QueryError::InvalidDistinctShape),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::FieldSpec;
    use serde_json::json;

    fn validate(v: Value) -> Result<QueryRequest, QueryError> {
        let raw: RawRequest = serde_json::from_value(v).unwrap();
        QueryRequest::try_from(raw)
    }

    #[test]
    fn defaults_apply_when_fields_are_missing() {
        let req = validate(json!({})).unwrap();
        assert!(req.filter.is_empty());
        assert_eq!(req.length, LengthIntent::Unbounded);
        assert!(req.distinct.is_empty());
    }

    #[test]
    fn single_distinct_string_is_a_one_element_list() {
        let req = validate(json!({"query": "", "len": 0, "distinct": "city"})).unwrap();
        assert_eq!(req.distinct.specs(), &[FieldSpec::Field("city".into())]);
    }

    #[test]
    fn distinct_array_keeps_order() {
        let req = validate(json!({"distinct": ["sexo", "fields", "city"]})).unwrap();
        let keys: Vec<&str> = req.distinct.specs().iter().map(FieldSpec::response_key).collect();
        assert_eq!(keys, vec!["sexo", "fields", "city"]);
    }

    #[test]
    fn bad_distinct_shapes_are_rejected() {
        for bad in [json!(5), json!({"a": 1}), json!(["ok", 3]), json!(true)] {
            let err = validate(json!({ "distinct": bad.clone() })).unwrap_err();
            assert!(matches!(err, QueryError::InvalidDistinctShape), "{bad}");
        }
    }

    #[test]
    fn len_accepts_numeric_strings() {
        assert_eq!(validate(json!({"len": "3"})).unwrap().length, LengthIntent::Bounded(3));
        assert_eq!(validate(json!({"len": ""})).unwrap().length, LengthIntent::Unbounded);
    }

    #[test]
    fn len_rejects_non_integers_and_small_values() {
        for bad in [json!("abc"), json!(1.5), json!(-2), json!([1])] {
            let err = validate(json!({ "len": bad.clone() })).unwrap_err();
            assert!(matches!(err, QueryError::InvalidLength(_)), "{bad}");
        }
    }

    #[test]
    fn multiple_queries_are_rejected() {
        let err = validate(json!({"query": ["a=1", "b=2"]})).unwrap_err();
        assert!(matches!(err, QueryError::InvalidRequest(_)));
    }

    #[test]
    fn from_json_str_requires_an_object() {
        assert!(RawRequest::from_json_str("[1]").is_err());
        assert!(RawRequest::from_json_str("not json").is_err());
        let raw = RawRequest::from_json_str(r#"{"query":"uid=x","len":-1}"#).unwrap();
        let req = QueryRequest::try_from(raw).unwrap();
        assert_eq!(req.filter.get("_id"), Some("x"));
    }

    #[test]
    fn constructor_round_trips_through_validation() {
        let raw = RawRequest::new("a=1", 4, Some(vec!["fields".into()]));
        let req = QueryRequest::try_from(raw).unwrap();
        assert_eq!(req.length, LengthIntent::Bounded(4));
        assert_eq!(req.distinct.specs(), &[FieldSpec::SchemaKeys]);
    }
}
