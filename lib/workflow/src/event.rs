//! Run lifecycle events.
//!
//! The sequencer reports progress through an [`EventSink`]. Hosts use it for
//! progress output; tests use it to observe ordering.

use chrono::{DateTime, Utc};
use hyperprov_core::{RunId, TaskTag};
use serde::Serialize;
use std::sync::{Mutex, PoisonError};

/// Something that happened during a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    RunStarted {
        run_id: RunId,
        workflow: String,
        steps: usize,
        at: DateTime<Utc>,
    },
    StepStarted {
        run_id: RunId,
        step_index: usize,
        step_name: String,
        at: DateTime<Utc>,
    },
    StepSkipped {
        run_id: RunId,
        step_index: usize,
        step_name: String,
        reason: String,
        at: DateTime<Utc>,
    },
    StepCompleted {
        run_id: RunId,
        step_index: usize,
        step_name: String,
        task_tag: Option<TaskTag>,
        polls: u32,
        at: DateTime<Utc>,
    },
    StepFailed {
        run_id: RunId,
        step_index: usize,
        step_name: String,
        kind: &'static str,
        error: String,
        at: DateTime<Utc>,
    },
    RunFinished {
        run_id: RunId,
        succeeded: bool,
        at: DateTime<Utc>,
    },
}

impl WorkflowEvent {
    /// The run this event belongs to.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        match self {
            Self::RunStarted { run_id, .. }
            | Self::StepStarted { run_id, .. }
            | Self::StepSkipped { run_id, .. }
            | Self::StepCompleted { run_id, .. }
            | Self::StepFailed { run_id, .. }
            | Self::RunFinished { run_id, .. } => *run_id,
        }
    }

    /// Short name of the event kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::StepStarted { .. } => "step_started",
            Self::StepSkipped { .. } => "step_skipped",
            Self::StepCompleted { .. } => "step_completed",
            Self::StepFailed { .. } => "step_failed",
            Self::RunFinished { .. } => "run_finished",
        }
    }
}

/// Receives workflow events. Must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &WorkflowEvent);
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: &WorkflowEvent) {}
}

impl<F> EventSink for F
where
    F: Fn(&WorkflowEvent) + Send + Sync,
{
    fn emit(&self, event: &WorkflowEvent) {
        self(event);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far, in order.
    #[must_use]
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Kinds of the events received so far, in order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(WorkflowEvent::kind)
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &WorkflowEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
