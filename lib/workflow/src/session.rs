//! Per-run collaborators.

use crate::event::{EventSink, NoopSink};
use hyperprov_transport::TransportPort;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Everything a single run talks to.
///
/// Each concurrent run gets its own session; nothing in it is shared with
/// other runs unless the caller clones the same handles in.
#[derive(Clone)]
pub struct Session {
    transport: Arc<dyn TransportPort>,
    cancel: CancellationToken,
    events: Arc<dyn EventSink>,
}

impl Session {
    /// Creates a session with a fresh cancellation token and no event sink.
    #[must_use]
    pub fn new(transport: Arc<dyn TransportPort>) -> Self {
        Self {
            transport,
            cancel: CancellationToken::new(),
            events: Arc::new(NoopSink),
        }
    }

    /// Uses `cancel` to stop the run.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Sends run events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    #[must_use]
    pub fn transport(&self) -> &dyn TransportPort {
        self.transport.as_ref()
    }

    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    #[must_use]
    pub fn events(&self) -> &dyn EventSink {
        self.events.as_ref()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
