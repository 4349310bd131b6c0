//! Cookie wire handling.
//!
//! Incoming `Cookie` headers are parsed into a plain name→value mapping;
//! outgoing cookies are modelled as [`SetCookie`] entries that the listener
//! adapter renders as `Set-Cookie` headers.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    /// Sent only for same-site requests.
    Strict,
    /// Sent for same-site requests and top-level navigations.
    Lax,
    /// Sent for all requests (requires `Secure` in browsers).
    None,
}

impl SameSite {
    /// Returns the attribute value as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// An outgoing cookie with its attributes.
///
/// Defaults are conservative: path `/`, `HttpOnly`, `SameSite=Lax`, session
/// lifetime (no `Max-Age`/`Expires`) unless one is set.
#[derive(Debug, Clone, PartialEq)]
pub struct SetCookie {
    /// Cookie name.
    pub name: String,
    /// Cookie value.
    pub value: String,
    /// Path scope.
    pub path: String,
    /// Lifetime in seconds.
    pub max_age: Option<i64>,
    /// Absolute expiry timestamp.
    pub expires: Option<DateTime<Utc>>,
    /// Whether the cookie is hidden from client-side scripts.
    pub http_only: bool,
    /// Whether the cookie is restricted to secure transports.
    pub secure: bool,
    /// Cross-site sending policy.
    pub same_site: SameSite,
}

impl SetCookie {
    /// Creates a cookie with safe default attributes.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: "/".to_string(),
            max_age: None,
            expires: None,
            http_only: true,
            secure: false,
            same_site: SameSite::Lax,
        }
    }

    /// Sets the path scope.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets the lifetime in seconds.
    #[must_use]
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Sets the absolute expiry timestamp.
    #[must_use]
    pub fn expires(mut self, at: DateTime<Utc>) -> Self {
        self.expires = Some(at);
        self
    }

    /// Sets whether the cookie is hidden from client-side scripts.
    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    /// Sets whether the cookie is restricted to secure transports.
    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the cross-site sending policy.
    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = same_site;
        self
    }

    /// Creates an expired cookie that instructs the client to drop `name`.
    pub fn removal(name: impl Into<String>) -> Self {
        Self::new(name, "").max_age(0)
    }

    /// Renders the cookie as a `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        out.push_str("; Path=");
        out.push_str(&self.path);
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={max_age}"));
        }
        if let Some(expires) = self.expires {
            out.push_str(&format!(
                "; Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        out.push_str("; SameSite=");
        out.push_str(self.same_site.as_str());
        out
    }
}

impl fmt::Display for SetCookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_header_value())
    }
}

/// Parses a `Cookie` request header into a name→value mapping.
///
/// Malformed pairs are skipped rather than rejected.
pub fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    header
        .split(';')
        .filter_map(|pair| {
            let mut parts = pair.trim().splitn(2, '=');
            let name = parts.next()?.trim();
            let value = parts.next()?.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_cookie_header() {
        let cookies = parse_cookie_header("sessionid=abc123; theme=dark; broken");
        assert_eq!(cookies.get("sessionid"), Some(&"abc123".to_string()));
        assert_eq!(cookies.get("theme"), Some(&"dark".to_string()));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert!(parse_cookie_header("").is_empty());
        assert!(parse_cookie_header("; ; =value").is_empty());
    }

    #[test]
    fn test_set_cookie_defaults() {
        let header = SetCookie::new("sessionid", "abc").to_header_value();
        assert_eq!(header, "sessionid=abc; Path=/; HttpOnly; SameSite=Lax");
    }

    #[test]
    fn test_set_cookie_attributes() {
        let expires = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let header = SetCookie::new("sessionid", "abc")
            .path("/app")
            .max_age(3600)
            .expires(expires)
            .secure(true)
            .same_site(SameSite::Strict)
            .to_header_value();
        assert_eq!(
            header,
            "sessionid=abc; Path=/app; Max-Age=3600; \
             Expires=Fri, 02 Jan 2026 03:04:05 GMT; Secure; HttpOnly; SameSite=Strict"
        );
    }

    #[test]
    fn test_removal_cookie() {
        let cookie = SetCookie::removal("sessionid");
        assert_eq!(cookie.value, "");
        assert_eq!(cookie.max_age, Some(0));
    }
}
