//! Task orchestration engine for the hyperprov provisioning tools.
//!
//! The cluster's control plane answers every mutating call with a task handle
//! and leaves the caller to poll until the task resolves. This crate provides:
//!
//! - **Task tracking**: bounded, delayed polling of a task handle to a
//!   terminal state ([`TaskTracker`], [`PollPolicy`], [`Clock`])
//! - **Operations**: declarative requests with body builders and result
//!   extractors ([`Operation`], [`ResultExtractor`])
//! - **Workflows**: validated, ordered step lists with optional guards
//!   ([`Workflow`], [`Guard`])
//! - **Sequencing**: strictly sequential execution threading results from one
//!   step into the next ([`WorkflowSequencer`], [`RunReport`])
//! - **Node selection**: migration target policy ([`NodeSelector`])
//!
//! The crate talks to the cluster only through
//! [`hyperprov_transport::TransportPort`].

pub mod definition;
pub mod error;
pub mod event;
pub mod node_selector;
pub mod operation;
pub mod poll;
pub mod results;
pub mod sequencer;
pub mod session;
pub mod task;
pub mod tracker;

pub use definition::{Guard, Step, Workflow, WorkflowBuilder};
pub use error::{
    BuildError, DefinitionError, ExtractError, NoCandidateError, PollLimit, PollTimeout,
    StepFailureCause, TaskFailure, TrackError, TransportFailure, WorkflowFailure,
};
pub use event::{EventSink, NoopSink, RecordingSink, WorkflowEvent};
pub use node_selector::{FirstAvailable, NodeSelector, select_migration_target};
pub use operation::{Completion, Operation, PathTemplate, ResultExtractor};
pub use poll::{Backoff, Clock, ManualClock, PollPolicy, TokioClock};
pub use results::ExtractedResult;
pub use sequencer::{RunReport, StepOutcome, StepRecord, WorkflowSequencer};
pub use session::Session;
pub use task::{TaskState, TaskStatus};
pub use tracker::{TaskCompletion, TaskTracker};
