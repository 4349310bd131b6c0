//! Path-segment converters and their registry.
//!
//! A capture like `{int:id}` names a converter kind. The registry maps kinds
//! to [`Converter`] implementations; lookups happen once, at route
//! registration, so the dispatch path never touches the registry.

use std::collections::HashMap;
use std::sync::Arc;

use patina_http::ParamValue;
use thiserror::Error;

use crate::error::{Result, RouterError};

/// A failed segment conversion.
///
/// On the dispatch path this only marks the candidate route as a non-match;
/// the reason is kept for near-miss diagnostics.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct ConversionError {
    reason: String,
}

impl ConversionError {
    /// Creates a conversion error with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// Returns the failure reason.
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Converts a raw path segment into a typed parameter value.
pub trait Converter: Send + Sync {
    /// Attempts the conversion.
    fn convert(&self, raw: &str) -> std::result::Result<ParamValue, ConversionError>;
}

impl<F> Converter for F
where
    F: Fn(&str) -> std::result::Result<ParamValue, ConversionError> + Send + Sync,
{
    fn convert(&self, raw: &str) -> std::result::Result<ParamValue, ConversionError> {
        self(raw)
    }
}

/// The built-in `int` converter: base-10 `i64`, rejects non-digits and
/// overflow.
pub struct IntConverter;

impl Converter for IntConverter {
    fn convert(&self, raw: &str) -> std::result::Result<ParamValue, ConversionError> {
        raw.parse::<i64>()
            .map(ParamValue::Int)
            .map_err(|e| ConversionError::new(format!("not a base-10 integer: {e}")))
    }
}

/// The built-in `str` converter: identity, always succeeds.
pub struct StrConverter;

impl Converter for StrConverter {
    fn convert(&self, raw: &str) -> std::result::Result<ParamValue, ConversionError> {
        Ok(ParamValue::Str(raw.to_string()))
    }
}

/// Registry of segment converters, keyed by kind.
///
/// Built during the registration phase and read-only afterwards. Each kind
/// is write-once: re-registering an existing kind is an error.
#[derive(Clone)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn Converter>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConverterRegistry {
    /// The kind name of the integer built-in.
    pub const INT: &'static str = "int";
    /// The kind name of the string built-in.
    pub const STR: &'static str = "str";

    /// Creates a registry with the `int` and `str` built-ins.
    pub fn new() -> Self {
        let mut converters: HashMap<String, Arc<dyn Converter>> = HashMap::new();
        converters.insert(Self::INT.to_string(), Arc::new(IntConverter));
        converters.insert(Self::STR.to_string(), Arc::new(StrConverter));
        Self { converters }
    }

    /// Registers a converter for a new kind.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        converter: impl Converter + 'static,
    ) -> Result<()> {
        let kind = kind.into();
        if self.converters.contains_key(&kind) {
            return Err(RouterError::ConverterExists { kind });
        }
        self.converters.insert(kind, Arc::new(converter));
        Ok(())
    }

    /// Looks up the converter for a kind.
    pub fn get(&self, kind: &str) -> Option<Arc<dyn Converter>> {
        self.converters.get(kind).cloned()
    }

    /// Returns whether a kind is registered.
    pub fn contains(&self, kind: &str) -> bool {
        self.converters.contains_key(kind)
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        f.debug_struct("ConverterRegistry")
            .field("kinds", &kinds)
            .finish()
    }
}
