//! Operations: one request of a workflow, described as data.
//!
//! An operation knows how to build its request from the results accumulated
//! so far, whether the response carries a task to wait on, and which values to
//! pull out of the response for later steps. It declares the keys it consumes
//! and produces so a workflow can be checked before it runs.

use crate::error::{BuildError, ExtractError};
use crate::results::ExtractedResult;
use hyperprov_transport::{Method, Request};
use serde_json::Value as JsonValue;
use std::fmt;
use std::sync::Arc;

type BodyFn = dyn Fn(&ExtractedResult) -> Result<Option<JsonValue>, BuildError> + Send + Sync;
type ExtractFn = dyn Fn(&JsonValue) -> Result<ExtractedResult, ExtractError> + Send + Sync;

/// How an operation finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The response carries a task handle to wait on.
    Task,
    /// The response is final; there is no task.
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Key(String),
}

/// A request path with `{key}` placeholders filled from accumulated results.
///
/// Each placeholder must render to a single path segment made of unreserved
/// URI characters; anything that could change the request target is refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
    keys: Vec<String>,
}

impl PathTemplate {
    /// Parses a template such as `/VirDomain/{vm_uuid}/clone`.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut segments = Vec::new();
        let mut keys = Vec::new();
        let mut rest = raw.as_str();
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            if open > 0 {
                segments.push(Segment::Literal(rest[..open].to_string()));
            }
            let key = after[..close].to_string();
            keys.push(key.clone());
            segments.push(Segment::Key(key));
            rest = &after[close + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        Self {
            raw,
            segments,
            keys,
        }
    }

    /// Keys the template references.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Renders the path in one pass; substituted values are never re-scanned.
    ///
    /// # Errors
    ///
    /// Returns an error if a referenced key is missing, not a scalar, or not a
    /// single path segment.
    pub fn render(&self, results: &ExtractedResult) -> Result<String, BuildError> {
        let mut path = String::with_capacity(self.raw.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Key(key) => {
                    let value = match results.require(key)? {
                        JsonValue::String(s) => s.clone(),
                        JsonValue::Number(n) => n.to_string(),
                        _ => {
                            return Err(BuildError::InvalidResult {
                                key: key.clone(),
                                expected: "a string or number",
                            });
                        }
                    };
                    if !is_path_segment(&value) {
                        return Err(BuildError::InvalidResult {
                            key: key.clone(),
                            expected: "a single path segment",
                        });
                    }
                    path.push_str(&value);
                }
            }
        }
        Ok(path)
    }
}

fn is_path_segment(value: &str) -> bool {
    !value.is_empty()
        && value != "."
        && value != ".."
        && value
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~'))
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Pulls named values out of a completed response.
#[derive(Clone)]
pub struct ResultExtractor {
    produces: Vec<String>,
    extract: Arc<ExtractFn>,
}

impl ResultExtractor {
    /// Extracts nothing.
    #[must_use]
    pub fn none() -> Self {
        Self {
            produces: Vec::new(),
            extract: Arc::new(|_: &JsonValue| -> Result<ExtractedResult, ExtractError> {
                Ok(ExtractedResult::new())
            }),
        }
    }

    /// Stores the value at a JSON pointer (e.g. `/createdUUID`) under `key`.
    #[must_use]
    pub fn field(key: impl Into<String>, pointer: impl Into<String>) -> Self {
        let key = key.into();
        let pointer = pointer.into();
        let produced = key.clone();
        Self {
            produces: vec![produced],
            extract: Arc::new(move |body: &JsonValue| -> Result<ExtractedResult, ExtractError> {
                let value = body
                    .pointer(&pointer)
                    .ok_or_else(|| ExtractError::MissingField {
                        pointer: pointer.clone(),
                    })?;
                Ok(ExtractedResult::new().with(key.clone(), value.clone()))
            }),
        }
    }

    /// Uses a custom function declared to produce `produces`.
    #[must_use]
    pub fn custom<F>(produces: &[&str], extract: F) -> Self
    where
        F: Fn(&JsonValue) -> Result<ExtractedResult, ExtractError> + Send + Sync + 'static,
    {
        Self {
            produces: produces.iter().map(ToString::to_string).collect(),
            extract: Arc::new(extract),
        }
    }

    /// Runs both extractors and merges their output.
    #[must_use]
    pub fn and(self, other: ResultExtractor) -> Self {
        let mut produces = self.produces;
        produces.extend(other.produces);
        let first = self.extract;
        let second = other.extract;
        Self {
            produces,
            extract: Arc::new(move |body: &JsonValue| -> Result<ExtractedResult, ExtractError> {
                let mut out = first(body)?;
                out.merge(second(body)?)?;
                Ok(out)
            }),
        }
    }

    /// Keys this extractor produces.
    #[must_use]
    pub fn produces(&self) -> &[String] {
        &self.produces
    }

    /// Extracts values from a response body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body lacks an expected field.
    pub fn extract(&self, body: &JsonValue) -> Result<ExtractedResult, ExtractError> {
        (self.extract)(body)
    }
}

impl fmt::Debug for ResultExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultExtractor")
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

/// One request of a workflow.
#[derive(Clone)]
pub struct Operation {
    name: String,
    method: Method,
    path: PathTemplate,
    completion: Completion,
    body: Option<Arc<BodyFn>>,
    body_requires: Vec<String>,
    extractor: ResultExtractor,
}

impl Operation {
    /// A mutating request answered with a task handle.
    #[must_use]
    pub fn submit(name: impl Into<String>, method: Method, path: impl Into<String>) -> Self {
        Self::new(name, method, path, Completion::Task)
    }

    /// A read answered synchronously.
    #[must_use]
    pub fn read(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Method::Get, path, Completion::Immediate)
    }

    fn new(
        name: impl Into<String>,
        method: Method,
        path: impl Into<String>,
        completion: Completion,
    ) -> Self {
        Self {
            name: name.into(),
            method,
            path: PathTemplate::new(path),
            completion,
            body: None,
            body_requires: Vec::new(),
            extractor: ResultExtractor::none(),
        }
    }

    /// Sets a body built from earlier results; `requires` lists the keys read.
    #[must_use]
    pub fn with_body<F>(mut self, requires: &[&str], build: F) -> Self
    where
        F: Fn(&ExtractedResult) -> Result<JsonValue, BuildError> + Send + Sync + 'static,
    {
        self.body_requires = requires.iter().map(ToString::to_string).collect();
        self.body = Some(Arc::new(move |results: &ExtractedResult| {
            build(results).map(Some)
        }));
        self
    }

    /// Sets the result extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: ResultExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Step name used in logs and reports.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> Method {
        self.method
    }

    /// Path template.
    #[must_use]
    pub fn path(&self) -> &PathTemplate {
        &self.path
    }

    /// How the operation finishes.
    #[must_use]
    pub fn completion(&self) -> Completion {
        self.completion
    }

    /// Keys read by the path and body, in declaration order, deduplicated.
    #[must_use]
    pub fn requires(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for key in self.path.keys().iter().chain(self.body_requires.iter()) {
            if !keys.contains(&key.as_str()) {
                keys.push(key);
            }
        }
        keys
    }

    /// Keys written by the extractor.
    #[must_use]
    pub fn produces(&self) -> &[String] {
        self.extractor.produces()
    }

    /// Builds the request from accumulated results.
    ///
    /// # Errors
    ///
    /// Returns an error if the path or body cannot be built.
    pub fn build_request(&self, results: &ExtractedResult) -> Result<Request, BuildError> {
        let path = self.path.render(results)?;
        let mut request = Request::new(self.method, path);
        if let Some(build) = &self.body
            && let Some(body) = build(results)?
        {
            request = request.with_body(body);
        }
        Ok(request)
    }

    /// Extracts results from the completed response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response lacks a declared field.
    pub fn extract(&self, body: &JsonValue) -> Result<ExtractedResult, ExtractError> {
        self.extractor.extract(body)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("name", &self.name)
            .field("method", &self.method)
            .field("path", &self.path)
            .field("completion", &self.completion)
            .field("requires", &self.requires())
            .field("produces", &self.produces())
            .finish()
    }
}
