//! Error types for the workflow crate.
//!
//! Failures are layered:
//! - `TaskFailure`, `TransportFailure`, `PollTimeout`, `NoCandidateError`:
//!   the four failure kinds a step can end in
//! - `TrackError`, `BuildError`, `ExtractError`: what each stage of a step
//!   reports
//! - `StepFailureCause`: the union of the above, pattern-matchable per kind
//! - `WorkflowFailure`: a cause wrapped with the failing step's position
//!
//! Remote diagnostic text is always carried verbatim.

use crate::results::ExtractedResult;
use hyperprov_core::{NodeUuid, RunId, TaskTag};
use hyperprov_transport::TransportError;
use serde_json::Value as JsonValue;
use std::fmt;
use std::time::Duration;

/// A remote task reached the ERROR state.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskFailure {
    /// The task that failed.
    pub task_tag: TaskTag,
    /// The cluster's formatted message.
    pub message: String,
    /// Structured substitution values accompanying the message.
    pub parameters: JsonValue,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "task {} failed: \"{}\" {}",
            self.task_tag, self.message, self.parameters
        )
    }
}

impl std::error::Error for TaskFailure {}

/// The cluster could not be reached or answered with a non-success status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    /// A response arrived with a non-2xx status.
    Status { status: u16, raw_body: String },
    /// No response arrived.
    Send(TransportError),
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status { status, raw_body } => write!(f, "{status}: {raw_body}"),
            Self::Send(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for TransportFailure {}

impl From<TransportError> for TransportFailure {
    fn from(e: TransportError) -> Self {
        Self::Send(e)
    }
}

/// Which poll limit was exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollLimit {
    /// Wall-clock deadline.
    Deadline(Duration),
    /// Maximum number of status queries.
    MaxAttempts(u32),
}

/// A task did not reach a terminal state within the poll limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTimeout {
    /// The task being waited on.
    pub task_tag: TaskTag,
    /// Status queries issued.
    pub polls: u32,
    /// Time spent waiting.
    pub elapsed: Duration,
    /// The limit that was hit.
    pub limit: PollLimit,
}

impl fmt::Display for PollTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            PollLimit::Deadline(deadline) => write!(
                f,
                "task {} not finished after {:?} (deadline {:?}, {} polls)",
                self.task_tag, self.elapsed, deadline, self.polls
            ),
            PollLimit::MaxAttempts(max) => write!(
                f,
                "task {} not finished after {} polls (limit {max})",
                self.task_tag, self.polls
            ),
        }
    }
}

impl std::error::Error for PollTimeout {}

/// No node other than the current one is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoCandidateError {
    /// The node the entity currently runs on.
    pub current: NodeUuid,
    /// Size of the membership listing that was searched.
    pub candidates: usize,
}

impl fmt::Display for NoCandidateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "no migration target: {} candidate node(s), none other than {}",
            self.candidates, self.current
        )
    }
}

impl std::error::Error for NoCandidateError {}

/// Errors from tracking a task to completion.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackError {
    /// The task reached ERROR.
    Task(TaskFailure),
    /// A status query failed.
    Transport(TransportFailure),
    /// Poll limits were exhausted.
    Timeout(PollTimeout),
    /// Tracking was cancelled before the task finished.
    Cancelled { task_tag: TaskTag },
    /// A status response could not be understood.
    MalformedStatus { task_tag: TaskTag, reason: String },
}

impl fmt::Display for TrackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Task(e) => write!(f, "{e}"),
            Self::Transport(e) => write!(f, "transport failure: {e}"),
            Self::Timeout(e) => write!(f, "timed out: {e}"),
            Self::Cancelled { task_tag } => {
                write!(f, "cancelled while waiting for task {task_tag}")
            }
            Self::MalformedStatus { task_tag, reason } => {
                write!(f, "malformed status for task {task_tag}: {reason}")
            }
        }
    }
}

impl std::error::Error for TrackError {}

/// Errors from building a request out of accumulated results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    /// A result key the step needs was never produced.
    MissingResult { key: String },
    /// A result value has the wrong shape.
    InvalidResult { key: String, expected: &'static str },
    /// No migration target could be selected.
    NoCandidate(NoCandidateError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingResult { key } => write!(f, "missing result '{key}'"),
            Self::InvalidResult { key, expected } => {
                write!(f, "result '{key}' is not {expected}")
            }
            Self::NoCandidate(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for BuildError {}

impl From<NoCandidateError> for BuildError {
    fn from(e: NoCandidateError) -> Self {
        Self::NoCandidate(e)
    }
}

/// Errors from extracting results out of a completed response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The response has nothing at the given JSON pointer.
    MissingField { pointer: String },
    /// The value at the pointer has the wrong shape.
    InvalidField {
        pointer: String,
        expected: &'static str,
    },
    /// The key was already produced earlier in the run.
    DuplicateKey { key: String },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { pointer } => {
                write!(f, "response has no field at '{pointer}'")
            }
            Self::InvalidField { pointer, expected } => {
                write!(f, "response field '{pointer}' is not {expected}")
            }
            Self::DuplicateKey { key } => {
                write!(f, "result '{key}' was already produced in this run")
            }
        }
    }
}

impl std::error::Error for ExtractError {}

/// Why a workflow step failed.
#[derive(Debug, Clone, PartialEq)]
pub enum StepFailureCause {
    /// Non-success status or no response.
    Transport(TransportFailure),
    /// The remote task reached ERROR.
    Task(TaskFailure),
    /// The task did not finish within the poll limits.
    Timeout(PollTimeout),
    /// No migration target was available.
    NoCandidate(NoCandidateError),
    /// The run was cancelled.
    Cancelled { task_tag: Option<TaskTag> },
    /// The request could not be built from accumulated results.
    Build(BuildError),
    /// A response did not have the expected shape.
    Protocol { reason: String },
    /// Results could not be extracted from the response.
    Extraction(ExtractError),
}

impl StepFailureCause {
    /// Returns the task involved in the failure, if one was submitted.
    #[must_use]
    pub fn task_tag(&self) -> Option<&TaskTag> {
        match self {
            Self::Task(e) => Some(&e.task_tag),
            Self::Timeout(e) => Some(&e.task_tag),
            Self::Cancelled { task_tag } => task_tag.as_ref(),
            _ => None,
        }
    }

    /// Short name of the failure kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::Task(_) => "task",
            Self::Timeout(_) => "timeout",
            Self::NoCandidate(_) => "no_candidate",
            Self::Cancelled { .. } => "cancelled",
            Self::Build(_) => "build",
            Self::Protocol { .. } => "protocol",
            Self::Extraction(_) => "extraction",
        }
    }
}

impl fmt::Display for StepFailureCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport failure: {e}"),
            Self::Task(e) => write!(f, "{e}"),
            Self::Timeout(e) => write!(f, "timed out: {e}"),
            Self::NoCandidate(e) => write!(f, "{e}"),
            Self::Cancelled { task_tag: Some(tag) } => {
                write!(f, "cancelled while waiting for task {tag}")
            }
            Self::Cancelled { task_tag: None } => write!(f, "cancelled"),
            Self::Build(e) => write!(f, "cannot build request: {e}"),
            Self::Protocol { reason } => write!(f, "unexpected response: {reason}"),
            Self::Extraction(e) => write!(f, "cannot extract results: {e}"),
        }
    }
}

impl std::error::Error for StepFailureCause {}

impl From<TrackError> for StepFailureCause {
    fn from(e: TrackError) -> Self {
        match e {
            TrackError::Task(e) => Self::Task(e),
            TrackError::Transport(e) => Self::Transport(e),
            TrackError::Timeout(e) => Self::Timeout(e),
            TrackError::Cancelled { task_tag } => Self::Cancelled {
                task_tag: Some(task_tag),
            },
            TrackError::MalformedStatus { task_tag, reason } => Self::Protocol {
                reason: format!("task {task_tag}: {reason}"),
            },
        }
    }
}

impl From<BuildError> for StepFailureCause {
    fn from(e: BuildError) -> Self {
        match e {
            BuildError::NoCandidate(e) => Self::NoCandidate(e),
            other => Self::Build(other),
        }
    }
}

impl From<TransportFailure> for StepFailureCause {
    fn from(e: TransportFailure) -> Self {
        Self::Transport(e)
    }
}

impl From<TransportError> for StepFailureCause {
    fn from(e: TransportError) -> Self {
        Self::Transport(TransportFailure::Send(e))
    }
}

impl From<ExtractError> for StepFailureCause {
    fn from(e: ExtractError) -> Self {
        Self::Extraction(e)
    }
}

/// A workflow run stopped at a failing step.
///
/// Steps before `step_index` completed and their remote effects stand;
/// `completed` holds what they produced.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowFailure {
    /// The run that failed.
    pub run_id: RunId,
    /// Name of the workflow.
    pub workflow: String,
    /// 1-based position of the failing step.
    pub step_index: usize,
    /// Name of the failing step.
    pub step_name: String,
    /// What went wrong.
    pub cause: StepFailureCause,
    /// Results accumulated before the failure.
    pub completed: ExtractedResult,
}

impl WorkflowFailure {
    /// Returns the task involved in the failure, if any.
    #[must_use]
    pub fn task_tag(&self) -> Option<&TaskTag> {
        self.cause.task_tag()
    }
}

impl fmt::Display for WorkflowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "workflow '{}' failed at step {} ({}): {}",
            self.workflow, self.step_index, self.step_name, self.cause
        )
    }
}

impl std::error::Error for WorkflowFailure {}

/// Errors from assembling a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefinitionError {
    /// The workflow has no steps.
    Empty { workflow: String },
    /// A step needs a key no earlier step or initial input provides.
    UnresolvedInput {
        step_index: usize,
        step_name: String,
        key: String,
    },
    /// An unguarded step needs a key only a guarded step produces.
    ConditionalInput {
        step_index: usize,
        step_name: String,
        key: String,
    },
    /// Two steps declare the same output key.
    DuplicateOutput {
        step_index: usize,
        step_name: String,
        key: String,
    },
}

impl fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { workflow } => write!(f, "workflow '{workflow}' has no steps"),
            Self::UnresolvedInput {
                step_index,
                step_name,
                key,
            } => write!(
                f,
                "step {step_index} ({step_name}) needs '{key}' which no earlier step produces"
            ),
            Self::ConditionalInput {
                step_index,
                step_name,
                key,
            } => write!(
                f,
                "step {step_index} ({step_name}) needs '{key}' which only a guarded step produces"
            ),
            Self::DuplicateOutput {
                step_index,
                step_name,
                key,
            } => write!(
                f,
                "step {step_index} ({step_name}) produces '{key}' which is already produced"
            ),
        }
    }
}

impl std::error::Error for DefinitionError {}
