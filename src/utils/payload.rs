//! Field-by-field reading of JSON write bodies.
//!
//! A value of the wrong shape is reported against its own key and read as
//! absent, so it ends up in the same error map as every other rejection
//! instead of failing the whole body.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use crate::errors::{AppError, FieldErrors, NON_FIELD_ERRORS};

pub const NOT_NULL: &str = "This field may not be null.";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NOT_AN_INTEGER: &str = "A valid integer is required.";
pub const BAD_DATE: &str = "Date has wrong format. Use one of these formats instead: YYYY-MM-DD.";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

pub struct JsonFields {
    body: Map<String, Value>,
    errors: FieldErrors,
}

impl JsonFields {
    /// Fails with a `non_field_errors` rejection unless `body` is an object.
    pub fn new(body: Value) -> Result<Self, AppError> {
        match body {
            Value::Object(body) => Ok(JsonFields { body, errors: FieldErrors::new() }),
            other => {
                let mut errors = FieldErrors::new();
                errors.add(
                    NON_FIELD_ERRORS,
                    format!("Invalid data. Expected a dictionary, but got {}.", type_name(&other)),
                );
                Err(AppError::Validation(errors))
            }
        }
    }

    fn take(&mut self, name: &str) -> Option<Value> {
        match self.body.remove(name)? {
            Value::Null => {
                self.errors.add(name, NOT_NULL);
                None
            }
            value => Some(value),
        }
    }

    fn reject<T>(&mut self, name: &str, reason: &str) -> Option<T> {
        self.errors.add(name, reason);
        None
    }

    /// Surrounding whitespace is trimmed; numbers are taken in their JSON form.
    pub fn string(&mut self, name: &str) -> Option<String> {
        match self.take(name)? {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => self.reject(name, NOT_A_STRING),
        }
    }

    /// Accepts an integral JSON number or a string holding one.
    pub fn integer(&mut self, name: &str) -> Option<i32> {
        let parsed = match self.take(name)? {
            Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        };
        parsed.or_else(|| self.reject(name, NOT_AN_INTEGER))
    }

    /// `YYYY-MM-DD` string.
    pub fn date(&mut self, name: &str) -> Option<NaiveDate> {
        let parsed = match self.take(name)? {
            Value::String(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok(),
            _ => None,
        };
        parsed.or_else(|| self.reject(name, BAD_DATE))
    }

    /// Rejections collected while reading. Keys never read are ignored.
    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(body: Value) -> JsonFields {
        JsonFields::new(body).unwrap()
    }

    fn reasons(errors: &FieldErrors, name: &str) -> Vec<String> {
        errors.get(name).map(<[String]>::to_vec).unwrap_or_default()
    }

    #[test]
    fn strings_are_trimmed_and_numbers_accepted() {
        let mut f = fields(json!({"postcode": " 1234 ", "city": 2000, "country": ["US"]}));
        assert_eq!(f.string("postcode").as_deref(), Some("1234"));
        assert_eq!(f.string("city").as_deref(), Some("2000"));
        assert_eq!(f.string("country"), None);
        assert_eq!(f.string("street_address"), None);

        let errors = f.into_errors();
        assert_eq!(reasons(&errors, "country"), vec![NOT_A_STRING]);
        assert!(errors.get("street_address").is_none());
    }

    #[test]
    fn null_is_reported_separately_from_absent() {
        let mut f = fields(json!({"first_name": null}));
        assert_eq!(f.string("first_name"), None);
        assert_eq!(f.string("last_name"), None);

        let errors = f.into_errors();
        assert_eq!(reasons(&errors, "first_name"), vec![NOT_NULL]);
        assert!(errors.get("last_name").is_none());
    }

    #[test]
    fn integers_accept_numbers_and_numeric_strings() {
        let mut f = fields(json!({"a": 3, "b": "7", "c": "three", "d": 2.5, "e": 4_000_000_000_i64}));
        assert_eq!(f.integer("a"), Some(3));
        assert_eq!(f.integer("b"), Some(7));
        assert_eq!(f.integer("c"), None);
        assert_eq!(f.integer("d"), None);
        assert_eq!(f.integer("e"), None);

        let errors = f.into_errors();
        for name in ["c", "d", "e"] {
            assert_eq!(reasons(&errors, name), vec![NOT_AN_INTEGER], "{}", name);
        }
    }

    #[test]
    fn dates_must_be_iso_strings() {
        let mut f = fields(json!({"a": "1990-01-31", "b": "31/01/1990", "c": 19900131}));
        assert_eq!(f.date("a"), NaiveDate::from_ymd_opt(1990, 1, 31));
        assert_eq!(f.date("b"), None);
        assert_eq!(f.date("c"), None);

        let errors = f.into_errors();
        assert_eq!(reasons(&errors, "b"), vec![BAD_DATE]);
        assert_eq!(reasons(&errors, "c"), vec![BAD_DATE]);
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        let Err(AppError::Validation(errors)) = JsonFields::new(json!(["x"])) else {
            panic!("expected a validation error");
        };
        assert_eq!(
            reasons(&errors, NON_FIELD_ERRORS),
            vec!["Invalid data. Expected a dictionary, but got list."]
        );
    }
}
