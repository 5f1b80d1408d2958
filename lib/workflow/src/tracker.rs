//! Drives one remote task to a terminal state.

use crate::error::{PollLimit, PollTimeout, TaskFailure, TrackError, TransportFailure};
use crate::poll::{Clock, PollPolicy, TokioClock};
use crate::task::{TaskState, TaskStatus};
use hyperprov_core::TaskTag;
use hyperprov_transport::{Request, TransportPort};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

/// A task that reached COMPLETE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    /// The completed task.
    pub task_tag: TaskTag,
    /// Status queries issued.
    pub polls: u32,
    /// Time spent waiting.
    pub elapsed: Duration,
}

/// Polls task status until the task completes, fails, or a limit is hit.
#[derive(Clone)]
pub struct TaskTracker {
    policy: PollPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TaskTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskTracker")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl TaskTracker {
    /// Creates a tracker on the tokio clock.
    #[must_use]
    pub fn new(policy: PollPolicy) -> Self {
        Self::with_clock(policy, Arc::new(TokioClock))
    }

    /// Creates a tracker on a custom clock.
    #[must_use]
    pub fn with_clock(policy: PollPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock }
    }

    /// Path of the status endpoint for a task.
    #[must_use]
    pub fn status_path(task_tag: &TaskTag) -> String {
        format!("/TaskTag/{task_tag}")
    }

    /// Waits for `task_tag` to reach a terminal state.
    ///
    /// An empty tag means the cluster had nothing to run asynchronously and
    /// completes immediately without polling. Cancellation is observed before
    /// every status query and interrupts the delay between queries.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::Task`] when the task reaches ERROR, a timeout when
    /// a poll limit is exhausted, and transport or protocol errors when a
    /// status query cannot be answered or understood. Nothing is retried.
    #[instrument(skip(self, transport, cancel), fields(task_tag = %task_tag))]
    pub async fn track(
        &self,
        transport: &dyn TransportPort,
        task_tag: &TaskTag,
        cancel: &CancellationToken,
    ) -> Result<TaskCompletion, TrackError> {
        if task_tag.is_empty() {
            debug!("empty task tag, nothing to wait for");
            return Ok(TaskCompletion {
                task_tag: task_tag.clone(),
                polls: 0,
                elapsed: Duration::ZERO,
            });
        }

        let started = self.clock.now();
        let mut polls: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(TrackError::Cancelled {
                    task_tag: task_tag.clone(),
                });
            }

            let response = transport
                .send(Request::get(Self::status_path(task_tag)))
                .await
                .map_err(|e| TrackError::Transport(TransportFailure::Send(e)))?;
            polls += 1;

            if !response.is_success() {
                return Err(TrackError::Transport(TransportFailure::Status {
                    status: response.status,
                    raw_body: response.raw_body(),
                }));
            }

            let status =
                TaskStatus::from_body(&response.body).map_err(|reason| {
                    TrackError::MalformedStatus {
                        task_tag: task_tag.clone(),
                        reason,
                    }
                })?;
            let elapsed = self.clock.now() - started;
            debug!(state = %status.state, polls, ?elapsed, "task status");

            match status.state {
                TaskState::Complete => {
                    return Ok(TaskCompletion {
                        task_tag: task_tag.clone(),
                        polls,
                        elapsed,
                    });
                }
                TaskState::Error => {
                    return Err(TrackError::Task(TaskFailure {
                        task_tag: task_tag.clone(),
                        message: status.message,
                        parameters: status.parameters,
                    }));
                }
                TaskState::Unknown(ref raw) => {
                    warn!(state = %raw, "unrecognized task state, still waiting");
                }
                TaskState::Pending | TaskState::Running => {}
            }

            if let Some(max) = self.policy.max_attempts.map(|max| max.max(1))
                && polls >= max
            {
                return Err(TrackError::Timeout(PollTimeout {
                    task_tag: task_tag.clone(),
                    polls,
                    elapsed,
                    limit: PollLimit::MaxAttempts(max),
                }));
            }

            let mut delay = self.policy.delay_after(polls);
            if let Some(deadline) = self.policy.deadline {
                if elapsed >= deadline {
                    return Err(TrackError::Timeout(PollTimeout {
                        task_tag: task_tag.clone(),
                        polls,
                        elapsed,
                        limit: PollLimit::Deadline(deadline),
                    }));
                }
                // Poll one last time right at the deadline.
                delay = delay.min(deadline - elapsed);
            }

            tokio::select! {
                () = cancel.cancelled() => {
                    return Err(TrackError::Cancelled { task_tag: task_tag.clone() });
                }
                () = self.clock.sleep(delay) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::ManualClock;
    use hyperprov_transport::{Method, Response, ScriptedTransport, TransportError};
    use serde_json::{Value as JsonValue, json};

    const TAG: &str = "1001";
    const STATUS_PATH: &str = "/TaskTag/1001";

    fn state(s: &str) -> Response {
        Response::ok(json!([{"state": s, "formattedMessage": "", "messageParameters": []}]))
    }

    fn error_state(message: &str, parameters: JsonValue) -> Response {
        Response::ok(json!([{
            "state": "ERROR",
            "formattedMessage": message,
            "messageParameters": parameters
        }]))
    }

    fn script(states: &[Response]) -> ScriptedTransport {
        let transport = ScriptedTransport::new();
        for response in states {
            transport.respond(Method::Get, STATUS_PATH, response.clone());
        }
        transport
    }

    fn tracker(policy: PollPolicy) -> (TaskTracker, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new());
        (TaskTracker::with_clock(policy, clock.clone()), clock)
    }

    #[tokio::test]
    async fn completes_after_pending_and_running_without_extra_polls() {
        let transport = script(&[
            state("PENDING"),
            state("PENDING"),
            state("RUNNING"),
            state("COMPLETE"),
        ]);
        let (tracker, clock) = tracker(PollPolicy::fixed(Duration::from_secs(2)));

        let completion = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .expect("task completes");

        assert_eq!(completion.polls, 4);
        assert_eq!(transport.count(Method::Get, STATUS_PATH), 4);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(2); 3]);
        assert_eq!(completion.elapsed, Duration::from_secs(6));
    }

    #[tokio::test]
    async fn immediate_complete_never_sleeps() {
        let transport = script(&[state("COMPLETE")]);
        let (tracker, clock) = tracker(PollPolicy::default());

        let completion = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(completion.polls, 1);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn error_carries_that_responses_message_and_parameters() {
        let transport = script(&[
            state("PENDING"),
            state("RUNNING"),
            state("RUNNING"),
            error_state("Insufficient resources", json!({"required": "8GB"})),
        ]);
        let (tracker, _clock) = tracker(PollPolicy::fixed(Duration::from_millis(100)));

        let err = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TrackError::Task(TaskFailure {
                task_tag: TaskTag::from(TAG),
                message: "Insufficient resources".to_string(),
                parameters: json!({"required": "8GB"}),
            })
        );
        assert_eq!(transport.count(Method::Get, STATUS_PATH), 4);
    }

    #[tokio::test]
    async fn backoff_delays_grow() {
        let transport = script(&[
            state("RUNNING"),
            state("RUNNING"),
            state("RUNNING"),
            state("COMPLETE"),
        ]);
        let (tracker, clock) = tracker(PollPolicy::exponential(
            Duration::from_secs(1),
            2.0,
            Duration::from_secs(3),
        ));

        tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            clock.sleeps(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(3)
            ]
        );
    }

    #[tokio::test]
    async fn deadline_produces_timeout_not_task_failure() {
        let transport = script(&[state("RUNNING")]);
        let (tracker, _clock) = tracker(
            PollPolicy::fixed(Duration::from_secs(4)).with_deadline(Duration::from_secs(10)),
        );

        let err = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap_err();

        let TrackError::Timeout(timeout) = err else {
            panic!("expected timeout, got {err:?}");
        };
        assert_eq!(timeout.limit, PollLimit::Deadline(Duration::from_secs(10)));
        assert_eq!(timeout.elapsed, Duration::from_secs(10));
        // Polls at 0s, 4s, 8s and a final one at the 10s deadline.
        assert_eq!(timeout.polls, 4);
    }

    #[tokio::test]
    async fn max_attempts_produces_timeout() {
        let transport = script(&[state("PENDING")]);
        let (tracker, clock) =
            tracker(PollPolicy::fixed(Duration::from_secs(1)).with_max_attempts(3));

        let err = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TrackError::Timeout(PollTimeout {
                polls: 3,
                limit: PollLimit::MaxAttempts(3),
                ..
            })
        ));
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[tokio::test]
    async fn zero_max_attempts_reports_the_single_poll_made() {
        let transport = script(&[state("RUNNING")]);
        let (tracker, clock) = tracker(PollPolicy {
            max_attempts: Some(0),
            ..PollPolicy::fixed(Duration::from_secs(1))
        });

        let err = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TrackError::Timeout(PollTimeout {
                polls: 1,
                limit: PollLimit::MaxAttempts(1),
                ..
            })
        ));
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn empty_tag_completes_without_polling() {
        let transport = ScriptedTransport::new();
        let (tracker, _clock) = tracker(PollPolicy::default());

        let completion = tracker
            .track(&transport, &TaskTag::from(""), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(completion.polls, 0);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_first_poll() {
        let transport = script(&[state("RUNNING")]);
        let (tracker, _clock) = tracker(PollPolicy::default());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = tracker
            .track(&transport, &TaskTag::from(TAG), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, TrackError::Cancelled { .. }));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn cancellation_interrupts_real_sleep() {
        let transport = script(&[state("RUNNING")]);
        let tracker = TaskTracker::new(PollPolicy::fixed(Duration::from_secs(3600)));
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = tracker
            .track(&transport, &TaskTag::from(TAG), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, TrackError::Cancelled { .. }));
        assert_eq!(transport.count(Method::Get, STATUS_PATH), 1);
    }

    #[tokio::test]
    async fn error_status_is_transport_failure() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Get,
            STATUS_PATH,
            Response::new(500, json!("Internal Server Error")),
        );
        let (tracker, _clock) = tracker(PollPolicy::default());

        let err = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TrackError::Transport(TransportFailure::Status {
                status: 500,
                raw_body: "Internal Server Error".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn connection_failure_is_not_retried() {
        let transport = ScriptedTransport::new();
        transport.fail(Method::Get, STATUS_PATH, TransportError::Timeout);
        let (tracker, _clock) = tracker(PollPolicy::default());

        let err = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            TrackError::Transport(TransportFailure::Send(TransportError::Timeout))
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn malformed_status_is_reported() {
        let transport = script(&[Response::ok(json!([]))]);
        let (tracker, _clock) = tracker(PollPolicy::default());

        let err = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, TrackError::MalformedStatus { .. }));
    }

    #[tokio::test]
    async fn unknown_state_keeps_waiting() {
        let transport = script(&[state("PAUSED"), state("COMPLETE")]);
        let (tracker, _clock) = tracker(PollPolicy::fixed(Duration::from_secs(1)));

        let completion = tracker
            .track(&transport, &TaskTag::from(TAG), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(completion.polls, 2);
    }
}
