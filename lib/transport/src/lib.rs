//! Request channel to the cluster REST API.
//!
//! This crate provides:
//!
//! - **TransportPort**: the trait the workflow engine sends requests through
//! - **Session context**: base address and pre-built headers for one cluster
//! - **HTTP transport**: a reqwest-backed implementation of the port
//! - **Retry wrapper**: optional retry of transient connection failures
//! - **Scripted transport**: an in-memory port that replays canned responses

pub mod error;
pub mod http;
pub mod port;
pub mod retry;
pub mod scripted;
pub mod session;

pub use error::TransportError;
pub use http::{HttpOptions, HttpTransport};
pub use port::{Method, Request, Response, TransportPort};
pub use retry::{RetryPolicy, RetryingTransport};
pub use scripted::ScriptedTransport;
pub use session::SessionContext;
