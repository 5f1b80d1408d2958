//! Workflow definitions.
//!
//! A workflow is an ordered list of steps, each an [`Operation`] optionally
//! guarded by a predicate over the results accumulated so far. Definitions
//! are checked when built: every key a step reads must come from the initial
//! inputs or an earlier step, and no key may be produced twice. Keys from a
//! guarded step may be missing at run time, so only guarded steps may read
//! them.

use crate::error::DefinitionError;
use crate::operation::Operation;
use crate::results::ExtractedResult;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

type GuardFn = dyn Fn(&ExtractedResult) -> bool + Send + Sync;

/// Predicate deciding whether a step runs.
#[derive(Clone)]
pub struct Guard {
    description: String,
    predicate: Arc<GuardFn>,
}

impl Guard {
    /// Creates a guard; the description appears in logs and run reports when
    /// the step is skipped.
    #[must_use]
    pub fn new<F>(description: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&ExtractedResult) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            predicate: Arc::new(predicate),
        }
    }

    /// Returns true if the step should run.
    #[must_use]
    pub fn allows(&self, results: &ExtractedResult) -> bool {
        (self.predicate)(results)
    }

    /// Human-readable condition.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// One step of a workflow.
#[derive(Debug, Clone)]
pub struct Step {
    operation: Operation,
    guard: Option<Guard>,
}

impl Step {
    /// The step's operation.
    #[must_use]
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// The step's guard, if conditional.
    #[must_use]
    pub fn guard(&self) -> Option<&Guard> {
        self.guard.as_ref()
    }

    /// Step name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.operation.name()
    }
}

/// An ordered, validated list of steps.
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    inputs: Vec<String>,
    steps: Vec<Step>,
}

impl Workflow {
    /// Starts building a workflow.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder {
            name: name.into(),
            inputs: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Workflow name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Keys the caller must provide as initial context.
    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Steps in execution order.
    #[must_use]
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if the workflow has no steps. Built workflows never do.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Builder for [`Workflow`].
#[derive(Debug)]
pub struct WorkflowBuilder {
    name: String,
    inputs: Vec<String>,
    steps: Vec<Step>,
}

impl WorkflowBuilder {
    /// Declares keys the caller supplies as initial context.
    #[must_use]
    pub fn inputs(mut self, keys: &[&str]) -> Self {
        self.inputs.extend(keys.iter().map(ToString::to_string));
        self
    }

    /// Appends an unconditional step.
    #[must_use]
    pub fn step(mut self, operation: Operation) -> Self {
        self.steps.push(Step {
            operation,
            guard: None,
        });
        self
    }

    /// Appends a step that runs only when `guard` allows it.
    #[must_use]
    pub fn step_if(mut self, guard: Guard, operation: Operation) -> Self {
        self.steps.push(Step {
            operation,
            guard: Some(guard),
        });
        self
    }

    /// Validates and builds the workflow.
    ///
    /// # Errors
    ///
    /// Returns an error if the workflow is empty, a step reads a key nothing
    /// before it produces, an unguarded step reads a key only a guarded step
    /// produces, or a key is produced twice.
    pub fn build(self) -> Result<Workflow, DefinitionError> {
        if self.steps.is_empty() {
            return Err(DefinitionError::Empty {
                workflow: self.name,
            });
        }

        let mut available: HashSet<&str> = self.inputs.iter().map(String::as_str).collect();
        // Produced by guarded steps; only guarded steps may read these.
        let mut conditional: HashSet<&str> = HashSet::new();
        for (i, step) in self.steps.iter().enumerate() {
            let step_index = i + 1;
            let guarded = step.guard.is_some();
            for key in step.operation.requires() {
                let conditional_only = conditional.contains(key);
                if available.contains(key) || (guarded && conditional_only) {
                    continue;
                }
                let step_name = step.name().to_string();
                let key = key.to_string();
                return Err(if conditional_only {
                    DefinitionError::ConditionalInput {
                        step_index,
                        step_name,
                        key,
                    }
                } else {
                    DefinitionError::UnresolvedInput {
                        step_index,
                        step_name,
                        key,
                    }
                });
            }
            for key in step.operation.produces() {
                let key = key.as_str();
                if available.contains(key) || conditional.contains(key) {
                    return Err(DefinitionError::DuplicateOutput {
                        step_index,
                        step_name: step.name().to_string(),
                        key: key.to_string(),
                    });
                }
                if guarded {
                    conditional.insert(key);
                } else {
                    available.insert(key);
                }
            }
        }

        Ok(Workflow {
            name: self.name,
            inputs: self.inputs,
            steps: self.steps,
        })
    }
}
