//! Runs a workflow's steps in order.
//!
//! Each step builds its request from the results accumulated so far,
//! submits it, waits for the task it started (if any), and folds the values
//! it extracts into the accumulated results. The first failing step stops the
//! run; earlier steps are not undone.

use crate::definition::{Step, Workflow};
use crate::error::{StepFailureCause, TransportFailure, WorkflowFailure};
use crate::event::WorkflowEvent;
use crate::operation::{Completion, Operation};
use crate::results::ExtractedResult;
use crate::session::Session;
use crate::tracker::TaskTracker;
use chrono::{DateTime, Utc};
use hyperprov_core::{RunId, TaskTag};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{info, instrument, warn};

/// JSON pointer to the task handle in a submission response.
pub const TASK_TAG_POINTER: &str = "/taskTag";

/// How a step ended in a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StepOutcome {
    Completed {
        /// Task that was awaited; absent for synchronous reads.
        task_tag: Option<TaskTag>,
        polls: u32,
    },
    Skipped {
        /// Description of the guard that declined the step.
        reason: String,
    },
}

/// One step's entry in a run report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepRecord {
    /// 1-based position in the workflow.
    pub index: usize,
    pub name: String,
    #[serde(flatten)]
    pub outcome: StepOutcome,
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub workflow: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepRecord>,
    /// Initial context plus every value extracted during the run.
    pub results: ExtractedResult,
}

impl RunReport {
    /// Number of steps that ran.
    #[must_use]
    pub fn completed_steps(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s.outcome, StepOutcome::Completed { .. }))
            .count()
    }

    /// Number of steps a guard skipped.
    #[must_use]
    pub fn skipped_steps(&self) -> usize {
        self.steps.len() - self.completed_steps()
    }
}

struct StepOutput {
    task_tag: Option<TaskTag>,
    polls: u32,
    extracted: ExtractedResult,
}

/// Executes workflows one step at a time.
#[derive(Debug, Clone)]
pub struct WorkflowSequencer {
    tracker: TaskTracker,
}

impl WorkflowSequencer {
    #[must_use]
    pub fn new(tracker: TaskTracker) -> Self {
        Self { tracker }
    }

    /// Runs `workflow` to completion starting from `initial`.
    ///
    /// Guards are evaluated against the results accumulated at the moment
    /// their step would start.
    ///
    /// # Errors
    ///
    /// Returns [`WorkflowFailure`] naming the first step that failed and why.
    /// Steps after it are never submitted.
    #[instrument(skip_all, fields(workflow = %workflow.name(), run_id = tracing::field::Empty))]
    pub async fn run(
        &self,
        session: &Session,
        workflow: &Workflow,
        initial: ExtractedResult,
    ) -> Result<RunReport, WorkflowFailure> {
        let run_id = RunId::new();
        tracing::Span::current().record("run_id", tracing::field::display(run_id));
        let started_at = Utc::now();
        let events = session.events();

        events.emit(&WorkflowEvent::RunStarted {
            run_id,
            workflow: workflow.name().to_string(),
            steps: workflow.len(),
            at: started_at,
        });

        let mut results = initial;
        let mut records = Vec::with_capacity(workflow.len());

        for (i, step) in workflow.steps().iter().enumerate() {
            let step_index = i + 1;

            if let Some(guard) = step.guard()
                && !guard.allows(&results)
            {
                info!(step_index, step = step.name(), guard = guard.description(), "step skipped");
                events.emit(&WorkflowEvent::StepSkipped {
                    run_id,
                    step_index,
                    step_name: step.name().to_string(),
                    reason: guard.description().to_string(),
                    at: Utc::now(),
                });
                records.push(StepRecord {
                    index: step_index,
                    name: step.name().to_string(),
                    outcome: StepOutcome::Skipped {
                        reason: guard.description().to_string(),
                    },
                });
                continue;
            }

            info!(step_index, step = step.name(), "step started");
            events.emit(&WorkflowEvent::StepStarted {
                run_id,
                step_index,
                step_name: step.name().to_string(),
                at: Utc::now(),
            });

            let outcome = match self.execute(session, step, &results).await {
                Ok(output) => results
                    .merge(output.extracted)
                    .map(|()| (output.task_tag, output.polls))
                    .map_err(StepFailureCause::from),
                Err(cause) => Err(cause),
            };

            match outcome {
                Ok((task_tag, polls)) => {
                    info!(step_index, step = step.name(), polls, "step completed");
                    events.emit(&WorkflowEvent::StepCompleted {
                        run_id,
                        step_index,
                        step_name: step.name().to_string(),
                        task_tag: task_tag.clone(),
                        polls,
                        at: Utc::now(),
                    });
                    records.push(StepRecord {
                        index: step_index,
                        name: step.name().to_string(),
                        outcome: StepOutcome::Completed { task_tag, polls },
                    });
                }
                Err(cause) => {
                    warn!(step_index, step = step.name(), kind = cause.kind(), error = %cause, "step failed");
                    events.emit(&WorkflowEvent::StepFailed {
                        run_id,
                        step_index,
                        step_name: step.name().to_string(),
                        kind: cause.kind(),
                        error: cause.to_string(),
                        at: Utc::now(),
                    });
                    events.emit(&WorkflowEvent::RunFinished {
                        run_id,
                        succeeded: false,
                        at: Utc::now(),
                    });
                    return Err(WorkflowFailure {
                        run_id,
                        workflow: workflow.name().to_string(),
                        step_index,
                        step_name: step.name().to_string(),
                        cause,
                        completed: results,
                    });
                }
            }
        }

        let finished_at = Utc::now();
        info!(steps = records.len(), "run finished");
        events.emit(&WorkflowEvent::RunFinished {
            run_id,
            succeeded: true,
            at: finished_at,
        });

        Ok(RunReport {
            run_id,
            workflow: workflow.name().to_string(),
            started_at,
            finished_at,
            steps: records,
            results,
        })
    }

    async fn execute(
        &self,
        session: &Session,
        step: &Step,
        results: &ExtractedResult,
    ) -> Result<StepOutput, StepFailureCause> {
        if session.cancellation().is_cancelled() {
            return Err(StepFailureCause::Cancelled { task_tag: None });
        }

        let operation = step.operation();
        let request = operation.build_request(results)?;
        let response = session.transport().send(request).await?;
        if !response.is_success() {
            return Err(TransportFailure::Status {
                status: response.status,
                raw_body: response.raw_body(),
            }
            .into());
        }

        match operation.completion() {
            Completion::Immediate => Ok(StepOutput {
                task_tag: None,
                polls: 0,
                extracted: operation.extract(&response.body)?,
            }),
            Completion::Task => {
                let task_tag = task_tag(operation, &response.body)?;
                let completion = self
                    .tracker
                    .track(session.transport(), &task_tag, session.cancellation())
                    .await?;
                // Values returned at submission are only trusted once the task completed.
                Ok(StepOutput {
                    task_tag: Some(completion.task_tag),
                    polls: completion.polls,
                    extracted: operation.extract(&response.body)?,
                })
            }
        }
    }
}

fn task_tag(operation: &Operation, body: &JsonValue) -> Result<TaskTag, StepFailureCause> {
    match body.pointer(TASK_TAG_POINTER) {
        Some(JsonValue::String(tag)) => Ok(TaskTag::from(tag.as_str())),
        Some(JsonValue::Number(tag)) => Ok(TaskTag::new(tag.to_string())),
        Some(other) => Err(StepFailureCause::Protocol {
            reason: format!(
                "{} {}: task handle at '{}' is not a string: {other}",
                operation.method(),
                operation.name(),
                TASK_TAG_POINTER
            ),
        }),
        None => Err(StepFailureCause::Protocol {
            reason: format!(
                "{} {}: response has no task handle at '{}'",
                operation.method(),
                operation.name(),
                TASK_TAG_POINTER
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::Guard;
    use crate::error::{BuildError, NoCandidateError, TaskFailure};
    use crate::event::RecordingSink;
    use crate::node_selector::select_migration_target;
    use crate::operation::ResultExtractor;
    use crate::poll::{ManualClock, PollPolicy};
    use hyperprov_core::NodeUuid;
    use hyperprov_transport::{Method, Response, ScriptedTransport, TransportError};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn state(s: &str) -> Response {
        Response::ok(json!([{"state": s, "formattedMessage": "", "messageParameters": []}]))
    }

    fn sequencer() -> WorkflowSequencer {
        let clock = Arc::new(ManualClock::new());
        WorkflowSequencer::new(TaskTracker::with_clock(
            PollPolicy::fixed(Duration::from_secs(1)),
            clock,
        ))
    }

    fn session(transport: &ScriptedTransport) -> Session {
        Session::new(Arc::new(transport.clone()))
    }

    fn create() -> Operation {
        Operation::submit("create vm", Method::Post, "/VirDomain")
            .with_body(&["vm_name"], |r| Ok(json!({"dom": {"name": r.require_str("vm_name")?}})))
            .with_extractor(ResultExtractor::field("createdUUID", "/createdUUID"))
    }

    fn action(name: &str, action_type: &'static str) -> Operation {
        Operation::submit(name, Method::Post, "/VirDomain/action").with_body(
            &["createdUUID"],
            move |r| {
                Ok(json!([{
                    "actionType": action_type,
                    "virDomainUUID": r.require_str("createdUUID")?
                }]))
            },
        )
    }

    fn list_nodes() -> Operation {
        Operation::read("list nodes", "/Node").with_extractor(ResultExtractor::custom(
            &["node_uuids"],
            |body| {
                let nodes: Vec<JsonValue> = body
                    .as_array()
                    .map(|nodes| nodes.iter().filter_map(|n| n.get("uuid").cloned()).collect())
                    .unwrap_or_default();
                Ok(ExtractedResult::new().with("node_uuids", nodes))
            },
        ))
    }

    fn read_current_node() -> Operation {
        Operation::read("read vm", "/VirDomain/{createdUUID}")
            .with_extractor(ResultExtractor::field("current_node", "/0/nodeUUID"))
    }

    fn migrate() -> Operation {
        Operation::submit("migrate vm", Method::Post, "/VirDomain/action").with_body(
            &["createdUUID", "node_uuids", "current_node"],
            |r| {
                let nodes: Vec<NodeUuid> = r
                    .require_array("node_uuids")?
                    .iter()
                    .filter_map(|n| n.as_str().map(NodeUuid::from))
                    .collect();
                let current = NodeUuid::from(r.require_str("current_node")?);
                let target = select_migration_target(&nodes, &current)?;
                Ok(json!([{
                    "actionType": "LIVEMIGRATE",
                    "nodeUUID": target.as_str(),
                    "virDomainUUID": r.require_str("createdUUID")?
                }]))
            },
        )
    }

    fn multi_node() -> Guard {
        Guard::new("cluster has more than one node", |r| {
            r.get("node_uuids")
                .and_then(JsonValue::as_array)
                .is_some_and(|nodes| nodes.len() > 1)
        })
    }

    fn inputs() -> ExtractedResult {
        ExtractedResult::new().with("vm_name", "vdi-01")
    }

    #[tokio::test]
    async fn create_then_start_threads_created_uuid() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::ok(json!({"taskTag": "t1", "createdUUID": "abc"})),
        );
        transport.respond(Method::Get, "/TaskTag/t1", state("PENDING"));
        transport.respond(Method::Get, "/TaskTag/t1", state("RUNNING"));
        transport.respond(Method::Get, "/TaskTag/t1", state("COMPLETE"));
        transport.respond(Method::Post, "/VirDomain/action", Response::ok(json!({"taskTag": "t2"})));
        transport.respond(Method::Get, "/TaskTag/t2", state("COMPLETE"));

        let workflow = Workflow::builder("create-and-start")
            .inputs(&["vm_name"])
            .step(create())
            .step(action("start vm", "START"))
            .build()
            .unwrap();

        let report = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .expect("workflow succeeds");

        assert_eq!(report.results.get_str("createdUUID"), Some("abc"));
        assert_eq!(transport.count(Method::Get, "/TaskTag/t1"), 3);
        assert_eq!(transport.count(Method::Get, "/TaskTag/t2"), 1);

        let submissions = transport.submissions();
        assert_eq!(submissions.len(), 2);
        assert_eq!(
            submissions[1].body,
            Some(json!([{"actionType": "START", "virDomainUUID": "abc"}]))
        );
        assert_eq!(
            report.steps[0].outcome,
            StepOutcome::Completed {
                task_tag: Some(TaskTag::from("t1")),
                polls: 3,
            }
        );
    }

    #[tokio::test]
    async fn missing_initial_input_fails_before_sending() {
        let transport = ScriptedTransport::new();
        let workflow = Workflow::builder("create")
            .inputs(&["vm_name"])
            .step(create())
            .build()
            .unwrap();

        let err = sequencer()
            .run(&session(&transport), &workflow, ExtractedResult::new())
            .await
            .unwrap_err();

        assert_eq!(err.step_index, 1);
        assert!(matches!(
            err.cause,
            StepFailureCause::Build(BuildError::MissingResult { ref key }) if key == "vm_name"
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn failing_step_stops_the_run_with_its_index() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::ok(json!({"taskTag": "t1", "createdUUID": "abc"})),
        );
        transport.respond(Method::Get, "/TaskTag/t1", state("COMPLETE"));
        transport.respond(
            Method::Post,
            "/VirDomainBlockDevice",
            Response::ok(json!({"taskTag": "t2", "createdUUID": "dev"})),
        );
        transport.respond(Method::Get, "/TaskTag/t2", state("RUNNING"));
        transport.respond(
            Method::Get,
            "/TaskTag/t2",
            Response::ok(json!([{
                "state": "ERROR",
                "formattedMessage": "Insufficient resources",
                "messageParameters": {"required": "8GB"}
            }])),
        );
        transport.respond(Method::Post, "/VirDomain/action", Response::ok(json!({"taskTag": "t3"})));

        let attach = Operation::submit("attach iso", Method::Post, "/VirDomainBlockDevice")
            .with_body(&["createdUUID"], |r| {
                Ok(json!({"virDomainUUID": r.require_str("createdUUID")?}))
            });
        let workflow = Workflow::builder("three-steps")
            .inputs(&["vm_name"])
            .step(create())
            .step(attach)
            .step(action("start vm", "START"))
            .build()
            .unwrap();

        let err = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .unwrap_err();

        assert_eq!(err.step_index, 2);
        assert_eq!(err.step_name, "attach iso");
        assert_eq!(
            err.cause,
            StepFailureCause::Task(TaskFailure {
                task_tag: TaskTag::from("t2"),
                message: "Insufficient resources".to_string(),
                parameters: json!({"required": "8GB"}),
            })
        );
        assert_eq!(err.task_tag(), Some(&TaskTag::from("t2")));
        assert_eq!(err.completed.get_str("createdUUID"), Some("abc"));
        assert_eq!(transport.submissions().len(), 2);
        assert_eq!(transport.count(Method::Post, "/VirDomain/action"), 0);
    }

    #[tokio::test]
    async fn guarded_migration_is_skipped_on_single_node_cluster() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::ok(json!({"taskTag": "t1", "createdUUID": "abc"})),
        );
        transport.respond(Method::Get, "/TaskTag/t1", state("COMPLETE"));
        transport.respond(Method::Get, "/Node", Response::ok(json!([{"uuid": "n1"}])));

        let workflow = Workflow::builder("maybe-migrate")
            .inputs(&["vm_name"])
            .step(create())
            .step(list_nodes())
            .step_if(multi_node(), read_current_node())
            .step_if(multi_node(), migrate())
            .build()
            .unwrap();

        let sink = Arc::new(RecordingSink::new());
        let session = session(&transport).with_events(sink.clone());
        let report = sequencer()
            .run(&session, &workflow, inputs())
            .await
            .expect("skipped steps do not fail the run");

        assert_eq!(report.completed_steps(), 2);
        assert_eq!(report.skipped_steps(), 2);
        assert_eq!(
            report.steps[3].outcome,
            StepOutcome::Skipped {
                reason: "cluster has more than one node".to_string()
            }
        );
        assert_eq!(transport.count(Method::Post, "/VirDomain/action"), 0);
        assert_eq!(
            sink.kinds(),
            vec![
                "run_started",
                "step_started",
                "step_completed",
                "step_started",
                "step_completed",
                "step_skipped",
                "step_skipped",
                "run_finished",
            ]
        );
    }

    #[tokio::test]
    async fn migration_targets_first_other_node() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::ok(json!({"taskTag": "t1", "createdUUID": "abc"})),
        );
        transport.respond(Method::Get, "/TaskTag/t1", state("COMPLETE"));
        transport.respond(
            Method::Get,
            "/Node",
            Response::ok(json!([{"uuid": "n1"}, {"uuid": "n2"}, {"uuid": "n3"}])),
        );
        transport.respond(
            Method::Get,
            "/VirDomain/abc",
            Response::ok(json!([{"uuid": "abc", "nodeUUID": "n1"}])),
        );
        transport.respond(Method::Post, "/VirDomain/action", Response::ok(json!({"taskTag": "t2"})));
        transport.respond(Method::Get, "/TaskTag/t2", state("COMPLETE"));

        let workflow = Workflow::builder("maybe-migrate")
            .inputs(&["vm_name"])
            .step(create())
            .step(list_nodes())
            .step_if(multi_node(), read_current_node())
            .step_if(multi_node(), migrate())
            .build()
            .unwrap();

        let report = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .unwrap();

        assert_eq!(report.completed_steps(), 4);
        let migrate = transport.submissions().pop().unwrap();
        assert_eq!(
            migrate.body,
            Some(json!([{"actionType": "LIVEMIGRATE", "nodeUUID": "n2", "virDomainUUID": "abc"}]))
        );
    }

    #[tokio::test]
    async fn unguarded_migration_on_single_node_fails_with_no_candidate() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::ok(json!({"taskTag": "t1", "createdUUID": "abc"})),
        );
        transport.respond(Method::Get, "/TaskTag/t1", state("COMPLETE"));
        transport.respond(Method::Get, "/Node", Response::ok(json!([{"uuid": "n1"}])));
        transport.respond(
            Method::Get,
            "/VirDomain/abc",
            Response::ok(json!([{"uuid": "abc", "nodeUUID": "n1"}])),
        );

        let workflow = Workflow::builder("always-migrate")
            .inputs(&["vm_name"])
            .step(create())
            .step(list_nodes())
            .step(read_current_node())
            .step(migrate())
            .build()
            .unwrap();

        let err = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .unwrap_err();

        assert_eq!(err.step_index, 4);
        assert_eq!(
            err.cause,
            StepFailureCause::NoCandidate(NoCandidateError {
                current: NodeUuid::from("n1"),
                candidates: 1,
            })
        );
        assert_eq!(transport.submissions().len(), 1);
    }

    #[tokio::test]
    async fn non_success_status_is_a_transport_failure() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::from_text(500, "internal error"),
        );

        let workflow = Workflow::builder("create")
            .inputs(&["vm_name"])
            .step(create())
            .build()
            .unwrap();

        let err = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .unwrap_err();

        assert_eq!(
            err.cause,
            StepFailureCause::Transport(TransportFailure::Status {
                status: 500,
                raw_body: "internal error".to_string(),
            })
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn connection_failure_is_not_retried() {
        let transport = ScriptedTransport::new();
        transport.fail(Method::Post, "/VirDomain", TransportError::Timeout);

        let workflow = Workflow::builder("create")
            .inputs(&["vm_name"])
            .step(create())
            .build()
            .unwrap();

        let err = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .unwrap_err();

        assert_eq!(
            err.cause,
            StepFailureCause::Transport(TransportFailure::Send(TransportError::Timeout))
        );
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn missing_task_handle_is_a_protocol_error() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::ok(json!({"createdUUID": "abc"})),
        );

        let workflow = Workflow::builder("create")
            .inputs(&["vm_name"])
            .step(create())
            .build()
            .unwrap();

        let err = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .unwrap_err();

        assert_eq!(err.cause.kind(), "protocol");
        assert_eq!(err.task_tag(), None);
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn empty_task_handle_completes_without_polling() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::ok(json!({"taskTag": "", "createdUUID": "abc"})),
        );

        let workflow = Workflow::builder("create")
            .inputs(&["vm_name"])
            .step(create())
            .build()
            .unwrap();

        let report = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .unwrap();

        assert_eq!(report.results.get_str("createdUUID"), Some("abc"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn numeric_task_handle_is_accepted() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::ok(json!({"taskTag": 42, "createdUUID": "abc"})),
        );
        transport.respond(Method::Get, "/TaskTag/42", state("COMPLETE"));

        let workflow = Workflow::builder("create")
            .inputs(&["vm_name"])
            .step(create())
            .build()
            .unwrap();

        let report = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .unwrap();

        assert_eq!(
            report.steps[0].outcome,
            StepOutcome::Completed {
                task_tag: Some(TaskTag::from("42")),
                polls: 1,
            }
        );
    }

    #[tokio::test]
    async fn cancelled_session_submits_nothing() {
        let transport = ScriptedTransport::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let workflow = Workflow::builder("create")
            .inputs(&["vm_name"])
            .step(create())
            .build()
            .unwrap();

        let err = sequencer()
            .run(
                &session(&transport).with_cancellation(cancel),
                &workflow,
                inputs(),
            )
            .await
            .unwrap_err();

        assert_eq!(err.cause, StepFailureCause::Cancelled { task_tag: None });
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn report_serializes_step_outcomes() {
        let transport = ScriptedTransport::new();
        transport.respond(
            Method::Post,
            "/VirDomain",
            Response::ok(json!({"taskTag": "t1", "createdUUID": "abc"})),
        );
        transport.respond(Method::Get, "/TaskTag/t1", state("COMPLETE"));

        let workflow = Workflow::builder("create")
            .inputs(&["vm_name"])
            .step(create())
            .build()
            .unwrap();

        let report = sequencer()
            .run(&session(&transport), &workflow, inputs())
            .await
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["workflow"], "create");
        assert_eq!(json["steps"][0]["outcome"], "completed");
        assert_eq!(json["steps"][0]["task_tag"], "t1");
        assert_eq!(json["results"]["createdUUID"], "abc");
        assert_eq!(json["results"]["vm_name"], "vdi-01");
    }
}
