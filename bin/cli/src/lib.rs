//! Command-line host for the hyperprov provisioning workflows.
//!
//! Loads settings, collects per-VM inputs, connects to the cluster and runs
//! one workflow per VM, printing progress and a final report.

pub mod cli;
pub mod error;
pub mod output;
pub mod progress;
pub mod prompt;
pub mod provision;
pub mod settings;

use crate::cli::{Cli, Command, OutputFormat};
use crate::error::CliError;
use crate::output::{VmSummary, render_json};
use crate::progress::ProgressPrinter;
use crate::prompt::{NoPrompter, Prompter, TerminalPrompter, collect_requests};
use crate::provision::{Provisioner, TransportFactory};
use crate::settings::Settings;
use hyperprov_catalog::{ProvisionRequest, clone_vdi, create_vdi};
use hyperprov_core::EntityUuid;
use hyperprov_transport::{HttpTransport, RetryingTransport, SessionContext, TransportPort};
use hyperprov_workflow::{
    EventSink, ExtractedResult, FirstAvailable, NoopSink, TaskTracker, WorkflowSequencer,
};
use rootcause::Report;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs the CLI. Returns whether every VM was provisioned.
///
/// # Errors
///
/// Returns an error if setup fails before any workflow runs.
pub async fn run(cli: Cli) -> Result<bool, Report<CliError>> {
    let settings = Settings::load(cli.config.as_deref())?;
    info!(host = %settings.cluster.host, "loaded configuration");

    let prompter: &dyn Prompter = if cli.no_input {
        &NoPrompter
    } else {
        &TerminalPrompter
    };

    let (workflow, args, source) = match &cli.command {
        Command::Create(args) => {
            let workflow = create_vdi(&settings.vm, Arc::new(FirstAvailable));
            (workflow, args, None)
        }
        Command::Clone(args) => {
            let source = args
                .source
                .as_deref()
                .map(EntityUuid::from)
                .or_else(|| settings.vm.clone_source.clone())
                .ok_or_else(|| CliError::Input {
                    reason: "clone source is required (--source or vm.clone_source)".to_string(),
                })?;
            (clone_vdi(&settings.vm), &args.provision, Some(source))
        }
    };
    let workflow = workflow.map_err(|e| CliError::Definition {
        reason: e.to_string(),
    })?;

    let requests = collect_requests(args, &settings.vm.departments, prompter)?;

    let password = match &settings.cluster.password {
        Some(password) => password.clone(),
        None => prompter.password(&format!(
            "Password for {}@{}",
            settings.cluster.username, settings.cluster.host
        ))?,
    };

    let transports = connect(&settings, &password)?;
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());

    let sequencer = WorkflowSequencer::new(TaskTracker::new(settings.poll_policy()));
    let output = cli.output;
    let provisioner = Provisioner::new(
        sequencer,
        transports,
        cancel,
        Box::new(move |request: &ProvisionRequest| -> Arc<dyn EventSink> {
            match output {
                OutputFormat::Text => {
                    Arc::new(ProgressPrinter::new(request.vm_name(), std::io::stdout()))
                }
                OutputFormat::Json => Arc::new(NoopSink),
            }
        }),
    );

    let summaries = provisioner
        .provision_all(&workflow, &requests, |request| {
            initial_context(request, source.as_ref())
        })
        .await;

    print_report(&summaries, cli.output)?;
    Ok(summaries.iter().all(VmSummary::succeeded))
}

fn connect(settings: &Settings, password: &str) -> Result<Box<TransportFactory>, Report<CliError>> {
    let context = SessionContext::for_host(
        &settings.cluster.host,
        &settings.cluster.username,
        password,
    );
    let http = HttpTransport::new(context, &settings.http_options()).map_err(|e| {
        CliError::Transport {
            reason: e.to_string(),
        }
    })?;

    let retry = settings.retry_policy();
    Ok(Box::new(move || -> Arc<dyn TransportPort> {
        if retry.is_disabled() {
            Arc::new(http.clone())
        } else {
            Arc::new(RetryingTransport::new(http.clone(), retry))
        }
    }))
}

fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping after the current poll; started tasks keep running");
            cancel.cancel();
        }
    });
}

fn initial_context(request: &ProvisionRequest, source: Option<&EntityUuid>) -> ExtractedResult {
    match source {
        Some(source) => request.clone_context(source),
        None => request.context(),
    }
}

fn print_report(summaries: &[VmSummary], format: OutputFormat) -> Result<(), CliError> {
    match format {
        OutputFormat::Text => {
            for summary in summaries {
                println!();
                print!("{summary}");
            }
        }
        OutputFormat::Json => println!("{}", render_json(summaries)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyperprov_workflow::Workflow;

    #[test]
    fn clone_context_only_with_source() {
        let request = ProvisionRequest::new("vdi-01", "Jane", "IT").unwrap();
        let source = EntityUuid::from("golden");

        assert!(
            initial_context(&request, Some(&source))
                .contains_key(hyperprov_catalog::keys::SOURCE_UUID)
        );
        assert!(
            !initial_context(&request, None).contains_key(hyperprov_catalog::keys::SOURCE_UUID)
        );
    }

    #[test]
    fn workflows_match_their_inputs() {
        let workflow: Workflow = clone_vdi(&Default::default()).unwrap();
        let request = ProvisionRequest::new("vdi-01", "Jane", "IT").unwrap();
        let context = initial_context(&request, Some(&EntityUuid::from("golden")));
        assert!(workflow.inputs().iter().all(|key| context.contains_key(key)));
    }
}
