//! reqwest-backed transport.

use crate::error::TransportError;
use crate::port::{Method, Request, Response, TransportPort};
use crate::session::SessionContext;
use async_trait::async_trait;
use hyperprov_core::Result;
use std::time::Duration;
use tracing::{debug, instrument};

/// Connection options for [`HttpTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpOptions {
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Accept self-signed or otherwise invalid TLS certificates.
    pub accept_invalid_certs: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(120),
            accept_invalid_certs: true,
        }
    }
}

/// Transport that sends requests over HTTP(S) with a pooled keep-alive client.
///
/// Clones are separate sessions over the same connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    context: SessionContext,
}

impl HttpTransport {
    /// Creates a transport for the given session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(context: SessionContext, options: &HttpOptions) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| TransportError::ClientSetup {
                reason: e.to_string(),
            })?;

        Ok(Self { client, context })
    }

}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

fn classify(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_builder() {
        TransportError::InvalidRequest {
            reason: err.to_string(),
        }
    } else {
        TransportError::ConnectionFailed {
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl TransportPort for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: Request) -> std::result::Result<Response, TransportError> {
        let url = self.context.url_for(&request.path);
        let mut builder = self.client.request(to_reqwest(request.method), &url);

        for (name, value) in self.context.headers().iter().chain(request.headers.iter()) {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| classify(&e))?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| classify(&e))?;

        debug!(status, bytes = text.len(), "received response");

        Ok(Response::from_text(status, &text))
    }
}
