//! Progress lines printed while a workflow runs.

use hyperprov_workflow::{EventSink, WorkflowEvent};
use std::io::Write;
use std::sync::{Mutex, PoisonError};

/// Prints one line per step event for a single VM.
pub struct ProgressPrinter<W> {
    vm_name: String,
    out: Mutex<W>,
}

impl<W: Write + Send> ProgressPrinter<W> {
    pub fn new(vm_name: impl Into<String>, out: W) -> Self {
        Self {
            vm_name: vm_name.into(),
            out: Mutex::new(out),
        }
    }

    /// The line for `event`, if it gets one.
    #[must_use]
    pub fn line(&self, event: &WorkflowEvent) -> Option<String> {
        let vm = &self.vm_name;
        match event {
            WorkflowEvent::StepStarted { step_name, .. } => Some(format!(">> {step_name} '{vm}'..")),
            WorkflowEvent::StepSkipped {
                step_name, reason, ..
            } => Some(format!("-- {step_name} '{vm}' skipped: {reason}")),
            WorkflowEvent::StepFailed {
                step_name, error, ..
            } => Some(format!("!! {step_name} '{vm}' failed: {error}")),
            WorkflowEvent::RunStarted { .. }
            | WorkflowEvent::StepCompleted { .. }
            | WorkflowEvent::RunFinished { .. } => None,
        }
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> EventSink for ProgressPrinter<W> {
    fn emit(&self, event: &WorkflowEvent) {
        if let Some(line) = self.line(event) {
            let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
            // Best effort: a closed stdout must not fail the run.
            let _ = writeln!(out, "{line}");
        }
    }
}
