//! The transport port and its request/response types.
//!
//! The workflow engine only ever talks to the cluster through
//! [`TransportPort`], which keeps it testable without a network and lets the
//! host decide how sessions are established.

use crate::error::TransportError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request relative to the session's base address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The HTTP method.
    pub method: Method,
    /// Path below the base address, starting with `/`.
    pub path: String,
    /// JSON body, if any.
    pub body: Option<JsonValue>,
    /// Extra headers for this request only.
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// Creates a request without a body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
        }
    }

    /// Creates a GET request.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// Sets the JSON body.
    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = Some(body);
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A response with its body already decoded.
///
/// Bodies that are not valid JSON are kept as a JSON string so the raw text is
/// never lost; an empty body decodes to `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// Decoded body.
    pub body: JsonValue,
}

impl Response {
    /// Creates a response.
    #[must_use]
    pub fn new(status: u16, body: JsonValue) -> Self {
        Self { status, body }
    }

    /// Creates a `200 OK` response.
    #[must_use]
    pub fn ok(body: JsonValue) -> Self {
        Self::new(200, body)
    }

    /// Decodes raw response text.
    #[must_use]
    pub fn from_text(status: u16, text: &str) -> Self {
        let body = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(text).unwrap_or_else(|_| JsonValue::String(text.to_string()))
        };
        Self { status, body }
    }

    /// Returns true for any 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as text, unquoted when it was not JSON.
    #[must_use]
    pub fn raw_body(&self) -> String {
        match &self.body {
            JsonValue::String(text) => text.clone(),
            JsonValue::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// Sends requests to the cluster.
///
/// Implementations own connection handling and authentication. They report a
/// response for every status code; classifying non-success statuses is the
/// caller's job.
#[async_trait]
pub trait TransportPort: Send + Sync {
    /// Sends a request and returns the decoded response.
    ///
    /// # Errors
    ///
    /// Returns an error only if no response was obtained.
    async fn send(&self, request: Request) -> Result<Response, TransportError>;
}

#[async_trait]
impl<T: TransportPort + ?Sized> TransportPort for std::sync::Arc<T> {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        (**self).send(request).await
    }
}
