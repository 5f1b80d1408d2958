//! Error types for the command-line host.

use std::fmt;

/// Errors that stop the CLI before or around a provisioning run.
///
/// Workflow failures are not errors here; they are reported per VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    /// Configuration could not be loaded or is incomplete.
    Config { reason: String },
    /// A required input was not given and could not be prompted for.
    Input { reason: String },
    /// The transport to the cluster could not be set up.
    Transport { reason: String },
    /// A workflow definition is inconsistent.
    Definition { reason: String },
    /// The report could not be written.
    Output { reason: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { reason } => write!(f, "configuration error: {reason}"),
            Self::Input { reason } => write!(f, "input error: {reason}"),
            Self::Transport { reason } => write!(f, "transport setup failed: {reason}"),
            Self::Definition { reason } => write!(f, "invalid workflow: {reason}"),
            Self::Output { reason } => write!(f, "cannot write report: {reason}"),
        }
    }
}

impl std::error::Error for CliError {}
