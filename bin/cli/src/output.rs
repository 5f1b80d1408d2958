//! Final per-VM report.

use crate::error::CliError;
use hyperprov_catalog::keys;
use hyperprov_core::{RunId, TaskTag};
use hyperprov_workflow::{ExtractedResult, RunReport, StepFailureCause, WorkflowFailure};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt;

/// How provisioning one VM ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum VmSummary {
    Succeeded {
        vm_name: String,
        vm_uuid: Option<String>,
        report: RunReport,
    },
    Failed {
        vm_name: String,
        run_id: RunId,
        step_index: usize,
        step_name: String,
        kind: &'static str,
        task_tag: Option<TaskTag>,
        error: String,
        /// Cluster message, verbatim, when a task failed.
        message: Option<String>,
        parameters: Option<JsonValue>,
        completed: ExtractedResult,
    },
}

impl VmSummary {
    #[must_use]
    pub fn new(vm_name: &str, outcome: Result<RunReport, WorkflowFailure>) -> Self {
        match outcome {
            Ok(report) => Self::Succeeded {
                vm_name: vm_name.to_string(),
                vm_uuid: report.results.get_str(keys::VM_UUID).map(String::from),
                report,
            },
            Err(failure) => {
                let (message, parameters) = match &failure.cause {
                    StepFailureCause::Task(task) => {
                        (Some(task.message.clone()), Some(task.parameters.clone()))
                    }
                    _ => (None, None),
                };
                Self::Failed {
                    vm_name: vm_name.to_string(),
                    run_id: failure.run_id,
                    step_index: failure.step_index,
                    step_name: failure.step_name.clone(),
                    kind: failure.cause.kind(),
                    task_tag: failure.task_tag().cloned(),
                    error: failure.cause.to_string(),
                    message,
                    parameters,
                    completed: failure.completed,
                }
            }
        }
    }

    #[must_use]
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Human-readable summary for one VM.
impl fmt::Display for VmSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded {
                vm_name, vm_uuid, ..
            } => {
                writeln!(f, "VDI Name:  {vm_name}")?;
                writeln!(f, "vm UUID:   {}", vm_uuid.as_deref().unwrap_or("-"))
            }
            Self::Failed {
                vm_name,
                step_index,
                step_name,
                kind,
                task_tag,
                error,
                message,
                parameters,
                completed,
                ..
            } => {
                writeln!(f, "VDI Name:  {vm_name}")?;
                writeln!(f, "failed at step {step_index} ({step_name}): {kind}")?;
                if let Some(tag) = task_tag {
                    writeln!(f, "  task:       {tag}")?;
                }
                match (message, parameters) {
                    (Some(message), Some(parameters)) => {
                        writeln!(f, "  message:    \"{message}\"")?;
                        writeln!(f, "  parameters: {parameters}")?;
                    }
                    _ => writeln!(f, "  error:      {error}")?,
                }
                if let Some(uuid) = completed.get_str(keys::VM_UUID) {
                    writeln!(f, "  vm UUID:    {uuid} (left in place)")?;
                }
                Ok(())
            }
        }
    }
}

/// JSON document with one entry per VM.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render_json(summaries: &[VmSummary]) -> Result<String, CliError> {
    serde_json::to_string_pretty(summaries).map_err(|e| CliError::Output {
        reason: e.to_string(),
    })
}
