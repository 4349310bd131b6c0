//! Path pattern compilation and matching.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::OnceLock;

use patina_http::PathParams;
use regex::Regex;

use crate::convert::{Converter, ConverterRegistry};
use crate::error::{Result, RouterError};

/// A segment in a compiled path pattern.
#[derive(Clone)]
pub enum Segment {
    /// A literal string segment.
    Literal(String),
    /// A typed capture segment (e.g., `{int:id}`).
    Capture {
        /// Parameter name the converted value is bound to.
        name: String,
        /// Converter kind named in the pattern.
        kind: String,
        /// Converter resolved at compile time.
        converter: Arc<dyn Converter>,
    },
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal(s) => f.debug_tuple("Literal").field(s).finish(),
            Self::Capture { name, kind, .. } => f
                .debug_struct("Capture")
                .field("name", name)
                .field("kind", kind)
                .finish(),
        }
    }
}

/// The result of matching one path against one pattern.
#[derive(Debug)]
pub enum MatchOutcome {
    /// All segments aligned and converted; parameters are bound.
    Matched(PathParams),
    /// Literals aligned but a capture failed to convert.
    ///
    /// Treated as a non-match by the route table; kept distinct so near
    /// misses can be logged.
    ConversionFailed {
        /// Capture name that failed.
        name: String,
        /// Raw segment value.
        value: String,
        /// Converter failure reason.
        reason: String,
    },
    /// Segment counts or literals did not align.
    NotMatched,
}

fn capture_name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("^[A-Za-z_][A-Za-z0-9_]*$").expect("valid capture name regex"))
}

/// A compiled path pattern.
///
/// Pattern syntax:
/// - `/users` - literal path
/// - `/users/{id}` - capture with the default `str` kind
/// - `/data/{int:id}` - capture with an explicit converter kind
///
/// One segment always corresponds to one path component; empty components
/// (doubled or trailing slashes) are ignored on both sides.
///
/// # Example
///
/// ```
/// use patina_router::{ConverterRegistry, PathPattern};
///
/// let registry = ConverterRegistry::new();
/// let pattern = PathPattern::parse("/posts/{int:id}", &registry).unwrap();
/// let params = pattern.match_path("/posts/123").unwrap();
/// assert_eq!(params.get_int("id"), Some(123));
/// assert!(pattern.match_path("/posts/abc").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PathPattern {
    /// The original pattern string.
    pattern: String,
    /// Compiled segments.
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compiles a pattern string, resolving capture converters.
    ///
    /// Fails if the pattern is empty, a capture name is not an identifier,
    /// a capture name repeats, or a capture kind has no registered
    /// converter.
    pub fn parse(pattern: &str, registry: &ConverterRegistry) -> Result<Self> {
        if pattern.trim().is_empty() {
            return Err(RouterError::EmptyPattern);
        }

        let mut segments = Vec::new();
        let mut seen = Vec::new();

        for part in pattern.split('/').filter(|s| !s.is_empty()) {
            if let Some(inner) = part.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                let (kind, name) = match inner.split_once(':') {
                    Some((kind, name)) => (kind, name),
                    None => (ConverterRegistry::STR, inner),
                };

                if !capture_name_regex().is_match(name) {
                    return Err(RouterError::InvalidCapture {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                if seen.contains(&name.to_string()) {
                    return Err(RouterError::DuplicateCapture {
                        pattern: pattern.to_string(),
                        name: name.to_string(),
                    });
                }
                seen.push(name.to_string());

                let converter =
                    registry
                        .get(kind)
                        .ok_or_else(|| RouterError::UnknownConverter {
                            kind: kind.to_string(),
                        })?;
                segments.push(Segment::Capture {
                    name: name.to_string(),
                    kind: kind.to_string(),
                    converter,
                });
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// Attempts to match a path against this pattern.
    ///
    /// Returns bound parameters if every segment aligns and converts.
    pub fn match_path(&self, path: &str) -> Option<PathParams> {
        match self.match_outcome(path) {
            MatchOutcome::Matched(params) => Some(params),
            _ => None,
        }
    }

    /// Matches a path, reporting conversion failures distinctly.
    pub fn match_outcome(&self, path: &str) -> MatchOutcome {
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() != self.segments.len() {
            return MatchOutcome::NotMatched;
        }

        let mut params = PathParams::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            match segment {
                Segment::Literal(literal) => {
                    if literal != part {
                        return MatchOutcome::NotMatched;
                    }
                }
                Segment::Capture {
                    name, converter, ..
                } => match converter.convert(part) {
                    Ok(value) => params.insert(name.clone(), value),
                    Err(err) => {
                        return MatchOutcome::ConversionFailed {
                            name: name.clone(),
                            value: (*part).to_string(),
                            reason: err.reason().to_string(),
                        }
                    }
                },
            }
        }

        MatchOutcome::Matched(params)
    }

    /// Returns the original pattern string.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns the capture names in pattern order.
    pub fn capture_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Capture { name, .. } => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Returns the compiled segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Generates a path from parameters.
    ///
    /// # Example
    ///
    /// ```
    /// use std::collections::HashMap;
    /// use patina_router::{ConverterRegistry, PathPattern};
    ///
    /// let registry = ConverterRegistry::new();
    /// let pattern = PathPattern::parse("/posts/{int:id}", &registry).unwrap();
    /// let params: HashMap<String, String> =
    ///     [("id".to_string(), "123".to_string())]
    ///     .into_iter()
    ///     .collect();
    /// assert_eq!(pattern.reverse(&params), Some("/posts/123".to_string()));
    /// ```
    pub fn reverse(&self, params: &HashMap<String, String>) -> Option<String> {
        let mut path = String::new();

        for segment in &self.segments {
            path.push('/');
            match segment {
                Segment::Literal(s) => path.push_str(s),
                Segment::Capture { name, .. } => {
                    path.push_str(params.get(name)?);
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }

        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ConverterRegistry {
        ConverterRegistry::new()
    }

    #[test]
    fn test_literal_path() {
        let pattern = PathPattern::parse("/users", &registry()).unwrap();
        assert!(pattern.match_path("/users").is_some());
        assert!(pattern.match_path("/users/").is_some());
        assert!(pattern.match_path("/posts").is_none());
        assert!(pattern.match_path("/users/extra").is_none());
    }

    #[test]
    fn test_default_kind_is_str() {
        let pattern = PathPattern::parse("/users/{id}", &registry()).unwrap();
        let params = pattern.match_path("/users/123").unwrap();
        assert_eq!(params.get_str("id"), Some("123"));
    }

    #[test]
    fn test_typed_capture() {
        let pattern = PathPattern::parse("/data/{int:id}", &registry()).unwrap();
        let params = pattern.match_path("/data/42").unwrap();
        assert_eq!(params.get_int("id"), Some(42));
    }

    #[test]
    fn test_conversion_failure_is_reported() {
        let pattern = PathPattern::parse("/data/{int:id}", &registry()).unwrap();
        match pattern.match_outcome("/data/abc") {
            MatchOutcome::ConversionFailed { name, value, .. } => {
                assert_eq!(name, "id");
                assert_eq!(value, "abc");
            }
            other => panic!("expected conversion failure, got {other:?}"),
        }
    }

    #[test]
    fn test_multiple_captures() {
        let pattern =
            PathPattern::parse("/posts/{int:post_id}/comments/{int:comment_id}", &registry())
                .unwrap();
        let params = pattern.match_path("/posts/42/comments/7").unwrap();
        assert_eq!(params.get_int("post_id"), Some(42));
        assert_eq!(params.get_int("comment_id"), Some(7));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        assert!(matches!(
            PathPattern::parse("", &registry()),
            Err(RouterError::EmptyPattern)
        ));
        assert!(matches!(
            PathPattern::parse("   ", &registry()),
            Err(RouterError::EmptyPattern)
        ));
        // Root is not empty: it matches exactly "/".
        let root = PathPattern::parse("/", &registry()).unwrap();
        assert!(root.match_path("/").is_some());
        assert!(root.match_path("/users").is_none());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        assert!(matches!(
            PathPattern::parse("/files/{uuid:id}", &registry()),
            Err(RouterError::UnknownConverter { kind }) if kind == "uuid"
        ));
    }

    #[test]
    fn test_invalid_capture_name_rejected() {
        assert!(matches!(
            PathPattern::parse("/users/{int:1bad}", &registry()),
            Err(RouterError::InvalidCapture { name, .. }) if name == "1bad"
        ));
    }

    #[test]
    fn test_duplicate_capture_rejected() {
        assert!(matches!(
            PathPattern::parse("/pairs/{int:id}/{int:id}", &registry()),
            Err(RouterError::DuplicateCapture { name, .. }) if name == "id"
        ));
    }

    #[test]
    fn test_reverse_missing_param() {
        let pattern = PathPattern::parse("/posts/{id}", &registry()).unwrap();
        let params: HashMap<String, String> = HashMap::new();
        assert!(pattern.reverse(&params).is_none());
    }
}
