//! In-memory transport replaying scripted responses.
//!
//! Responses are queued per `(method, path)` and consumed in order. When a
//! queue holds a single entry it is treated as sticky and answers every
//! further request, which keeps polling scripts short. Every request is
//! recorded so tests can assert on what was sent and in which order.

use crate::error::TransportError;
use crate::port::{Method, Request, Response, TransportPort};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

type Reply = Result<Response, TransportError>;

#[derive(Debug, Default)]
struct Script {
    replies: HashMap<(Method, String), VecDeque<Reply>>,
    requests: Vec<Request>,
}

/// Transport answering from a script instead of the network.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTransport {
    inner: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    /// Creates an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        let mut script = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        script
            .replies
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
    }

    /// Queues a response.
    pub fn respond(&self, method: Method, path: &str, response: Response) {
        self.push(method, path, Ok(response));
    }

    /// Queues a transport failure.
    pub fn fail(&self, method: Method, path: &str, error: TransportError) {
        self.push(method, path, Err(error));
    }

    /// Returns every request received so far, in order.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .clone()
    }

    /// Returns how many requests were sent to `method path`.
    #[must_use]
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Returns the requests that were not GETs, in order.
    #[must_use]
    pub fn submissions(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.method != Method::Get)
            .collect()
    }
}

#[async_trait]
impl TransportPort for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let mut script = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (request.method, request.path.clone());
        script.requests.push(request);

        let Some(queue) = script.replies.get_mut(&key) else {
            return Err(TransportError::ConnectionFailed {
                reason: format!("no scripted response for {} {}", key.0, key.1),
            });
        };
        let reply = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        reply.unwrap_or_else(|| {
            Err(TransportError::ConnectionFailed {
                reason: format!("script exhausted for {} {}", key.0, key.1),
            })
        })
    }
}
