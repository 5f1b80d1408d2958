//! Runs one workflow per VM concurrently.

use crate::output::VmSummary;
use futures::future::join_all;
use hyperprov_catalog::ProvisionRequest;
use hyperprov_transport::TransportPort;
use hyperprov_workflow::{
    EventSink, ExtractedResult, Session, Workflow, WorkflowSequencer,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// Builds the per-VM event sink.
pub type SinkFactory = dyn Fn(&ProvisionRequest) -> Arc<dyn EventSink> + Send + Sync;

/// Opens the transport session for one run.
pub type TransportFactory = dyn Fn() -> Arc<dyn TransportPort> + Send + Sync;

/// Shared handles for a batch of runs.
pub struct Provisioner {
    sequencer: WorkflowSequencer,
    transports: Box<TransportFactory>,
    cancel: CancellationToken,
    sinks: Box<SinkFactory>,
}

impl Provisioner {
    pub fn new(
        sequencer: WorkflowSequencer,
        transports: Box<TransportFactory>,
        cancel: CancellationToken,
        sinks: Box<SinkFactory>,
    ) -> Self {
        Self {
            sequencer,
            transports,
            cancel,
            sinks,
        }
    }

    /// Runs `workflow` once per request and waits for every run to finish.
    ///
    /// Runs are cancelled together, but each has its own transport session,
    /// event sink and results. A failing run does not stop the others.
    /// Summaries come back in request order.
    #[instrument(skip_all, fields(workflow = %workflow.name(), vms = requests.len()))]
    pub async fn provision_all<F>(
        &self,
        workflow: &Workflow,
        requests: &[ProvisionRequest],
        context: F,
    ) -> Vec<VmSummary>
    where
        F: Fn(&ProvisionRequest) -> ExtractedResult,
    {
        let runs = requests.iter().map(|request| {
            let session = Session::new((self.transports)())
                .with_cancellation(self.cancel.child_token())
                .with_events((self.sinks)(request));
            let initial = context(request);
            async move {
                info!(vm = request.vm_name(), "provisioning");
                let outcome = self.sequencer.run(&session, workflow, initial).await;
                VmSummary::new(request.vm_name(), outcome)
            }
        });
        join_all(runs).await
    }
}
