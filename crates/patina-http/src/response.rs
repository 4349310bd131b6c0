//! HTTP response type.

use std::collections::HashMap;

use crate::cookie::SetCookie;

/// An HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Cookies to set on the client.
    ///
    /// Kept apart from `headers` because a response may carry several
    /// `Set-Cookie` entries; the listener adapter renders one header line
    /// per entry.
    pub cookies: Vec<SetCookie>,
    /// Response body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a new response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            cookies: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Creates a 200 OK response.
    pub fn ok() -> Self {
        Self::new(200)
    }

    /// Creates a response with HTML content.
    pub fn html(body: impl Into<String>) -> Self {
        let body_str = body.into();
        Self::new(200)
            .header("Content-Type", "text/html; charset=utf-8")
            .body(body_str.into_bytes())
    }

    /// Creates a response with JSON content.
    pub fn json<T: serde::Serialize>(data: &T) -> Self {
        match serde_json::to_vec(data) {
            Ok(body) => Self::new(200)
                .header("Content-Type", "application/json")
                .body(body),
            Err(_) => Self::internal_server_error(),
        }
    }

    /// Creates a response with plain text content.
    pub fn text(body: impl Into<String>) -> Self {
        let body_str = body.into();
        Self::new(200)
            .header("Content-Type", "text/plain; charset=utf-8")
            .body(body_str.into_bytes())
    }

    /// Creates a redirect response.
    pub fn redirect(url: impl Into<String>) -> Self {
        Self::new(302).header("Location", url)
    }

    /// Creates a permanent redirect response.
    pub fn redirect_permanent(url: impl Into<String>) -> Self {
        Self::new(301).header("Location", url)
    }

    /// Creates a 201 Created response with JSON content.
    pub fn created<T: serde::Serialize>(data: &T) -> Self {
        Self::json(data).status(201)
    }

    /// Creates a 204 No Content response.
    pub fn no_content() -> Self {
        Self::new(204)
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request() -> Self {
        Self::new(400).body(b"Bad Request".to_vec())
    }

    /// Creates a 401 Unauthorized response.
    pub fn unauthorized() -> Self {
        Self::new(401).body(b"Unauthorized".to_vec())
    }

    /// Creates a 403 Forbidden response.
    pub fn forbidden() -> Self {
        Self::new(403).body(b"Forbidden".to_vec())
    }

    /// Creates a 404 Not Found response.
    pub fn not_found() -> Self {
        Self::new(404).body(b"Not Found".to_vec())
    }

    /// Creates the 499 marker used when the transport aborted mid-dispatch.
    ///
    /// The dispatcher routes it through the already-entered middleware
    /// phases; the listener discards it instead of sending.
    pub fn client_closed() -> Self {
        Self::new(499).body(b"Client Closed Request".to_vec())
    }

    /// Creates a 500 Internal Server Error response.
    pub fn internal_server_error() -> Self {
        Self::new(500).body(b"Internal Server Error".to_vec())
    }

    /// Sets a header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Sets the status code.
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Adds a cookie to set on the client.
    #[must_use]
    pub fn set_cookie(mut self, cookie: SetCookie) -> Self {
        self.add_cookie(cookie);
        self
    }

    /// Adds a cookie in place, replacing a pending cookie of the same name.
    pub fn add_cookie(&mut self, cookie: SetCookie) {
        self.cookies.retain(|c| c.name != cookie.name);
        self.cookies.push(cookie);
    }

    /// Gets a pending cookie by name.
    pub fn get_cookie(&self, name: &str) -> Option<&SetCookie> {
        self.cookies.iter().find(|c| c.name == name)
    }

    /// Returns the body as a string.
    pub fn body_string(&self) -> Option<String> {
        String::from_utf8(self.body.clone()).ok()
    }

    /// Returns whether the status is a success (2xx) code.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the status text for the current status code.
    pub fn status_text(&self) -> &'static str {
        match self.status {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            301 => "Moved Permanently",
            302 => "Found",
            304 => "Not Modified",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            409 => "Conflict",
            422 => "Unprocessable Entity",
            499 => "Client Closed Request",
            500 => "Internal Server Error",
            502 => "Bad Gateway",
            503 => "Service Unavailable",
            _ => "Unknown",
        }
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_html() {
        let res = Response::html("<h1>Hello</h1>");
        assert_eq!(res.status, 200);
        assert_eq!(
            res.headers.get("Content-Type"),
            Some(&"text/html; charset=utf-8".to_string())
        );
        assert_eq!(res.body_string(), Some("<h1>Hello</h1>".to_string()));
    }

    #[test]
    fn test_response_json() {
        let data = serde_json::json!({"name": "test"});
        let res = Response::json(&data);
        assert_eq!(res.status, 200);
        assert_eq!(
            res.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_response_redirect() {
        let res = Response::redirect("/login");
        assert_eq!(res.status, 302);
        assert_eq!(res.headers.get("Location"), Some(&"/login".to_string()));
    }

    #[test]
    fn test_response_builder() {
        let res = Response::ok().header("X-Custom", "value").body("Hello");

        assert_eq!(res.status, 200);
        assert_eq!(res.headers.get("X-Custom"), Some(&"value".to_string()));
        assert_eq!(res.body_string(), Some("Hello".to_string()));
    }

    #[test]
    fn test_set_cookie_replaces_same_name() {
        let res = Response::ok()
            .set_cookie(SetCookie::new("sessionid", "old"))
            .set_cookie(SetCookie::new("theme", "dark"))
            .set_cookie(SetCookie::new("sessionid", "new"));

        assert_eq!(res.cookies.len(), 2);
        assert_eq!(res.get_cookie("sessionid").unwrap().value, "new");
    }

    #[test]
    fn test_status_text() {
        assert_eq!(Response::client_closed().status_text(), "Client Closed Request");
        assert_eq!(Response::new(599).status_text(), "Unknown");
    }
}
