//! Per-cluster session context.
//!
//! A `SessionContext` replaces process-wide connection globals: each workflow
//! run holds its own, so runs against different clusters or with different
//! credentials never share state.

use base64::Engine;
use std::fmt;

/// Path of the REST API below the cluster host.
pub const API_ROOT: &str = "/rest/v1";

/// Base address plus the headers attached to every request.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionContext {
    base_url: String,
    headers: Vec<(String, String)>,
}

impl SessionContext {
    /// Creates a context for an explicit base URL with no default headers.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: Vec::new(),
        }
    }

    /// Creates a context for the REST API of `host` over HTTPS, with JSON
    /// content type, keep-alive, and a basic-auth header built from the given
    /// credentials.
    #[must_use]
    pub fn for_host(host: &str, username: &str, password: &str) -> Self {
        Self::new(format!("https://{host}{API_ROOT}"))
            .with_header("Content-Type", "application/json")
            .with_header("Connection", "keep-alive")
            .with_header("Authorization", basic_auth_header(username, password))
    }

    /// Adds a default header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the default headers.
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Joins a request path onto the base URL.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }
}

impl fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: Vec<(&str, &str)> = self
            .headers
            .iter()
            .map(|(name, value)| {
                if name.eq_ignore_ascii_case("authorization") {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();
        f.debug_struct("SessionContext")
            .field("base_url", &self.base_url)
            .field("headers", &headers)
            .finish()
    }
}

/// Builds an HTTP basic-auth header value.
#[must_use]
pub fn basic_auth_header(username: &str, password: &str) -> String {
    let encoded =
        base64::engine::general_purpose::STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}
