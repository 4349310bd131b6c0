//! Typed path parameters bound during route resolution.

use std::collections::HashMap;
use std::fmt;

use crate::error::{HttpError, Result};

/// A path segment value converted to its registered type.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// A base-10 integer capture.
    Int(i64),
    /// A plain string capture.
    Str(String),
    /// A custom-converted capture, carried as a JSON value.
    Value(serde_json::Value),
}

impl ParamValue {
    /// Returns the integer value, if this parameter is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string value, if this parameter is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Returns the JSON value of a custom-converted parameter.
    pub fn as_value(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Converts the parameter into a JSON value.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Int(n) => serde_json::Value::from(*n),
            Self::Str(s) => serde_json::Value::from(s.as_str()),
            Self::Value(v) => v.clone(),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Value(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<serde_json::Value> for ParamValue {
    fn from(v: serde_json::Value) -> Self {
        Self::Value(v)
    }
}

/// Path parameters extracted from the URL.
#[derive(Debug, Clone, Default)]
pub struct PathParams {
    params: HashMap<String, ParamValue>,
}

impl PathParams {
    /// Creates new empty path params.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a parameter.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.params.insert(key.into(), value.into());
    }

    /// Gets a parameter value.
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Gets a string parameter value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ParamValue::as_str)
    }

    /// Gets an integer parameter value.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ParamValue::as_int)
    }

    /// Gets a parameter value or returns an error.
    pub fn require(&self, key: &str) -> Result<&ParamValue> {
        self.get(key)
            .ok_or_else(|| HttpError::MissingParam(key.to_string()))
    }

    /// Gets an integer parameter or returns an error.
    pub fn require_int(&self, key: &str) -> Result<i64> {
        self.require(key)?
            .as_int()
            .ok_or_else(|| HttpError::ParamType {
                name: key.to_string(),
                expected: "integer",
            })
    }

    /// Parses a parameter's display form as a specific type.
    pub fn parse<T: std::str::FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.to_string().parse().ok())
    }

    /// Returns an iterator over the parameters.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of bound parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns whether no parameters are bound.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_access() {
        let mut params = PathParams::new();
        params.insert("id", 42i64);
        params.insert("slug", "hello-world");

        assert_eq!(params.get_int("id"), Some(42));
        assert_eq!(params.get_str("slug"), Some("hello-world"));
        assert_eq!(params.get_int("slug"), None);
        assert!(params.get("missing").is_none());
    }

    #[test]
    fn test_require() {
        let mut params = PathParams::new();
        params.insert("id", 7i64);

        assert_eq!(params.require_int("id").unwrap(), 7);
        assert!(params.require("missing").is_err());
        params.insert("name", "seven");
        assert!(params.require_int("name").is_err());
    }

    #[test]
    fn test_parse_from_display() {
        let mut params = PathParams::new();
        params.insert("id", 123i64);
        params.insert("page", "15");

        assert_eq!(params.parse::<u32>("id"), Some(123));
        assert_eq!(params.parse::<u32>("page"), Some(15));
        assert_eq!(params.parse::<u32>("missing"), None);
    }

    #[test]
    fn test_to_json() {
        assert_eq!(ParamValue::Int(5).to_json(), serde_json::json!(5));
        assert_eq!(
            ParamValue::Str("a".to_string()).to_json(),
            serde_json::json!("a")
        );
    }
}
