//! Command-line arguments.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Provision VDI workstations on a hypervisor cluster.
#[derive(Debug, Parser)]
#[command(name = "hyperprov", version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Report format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Fail instead of prompting for missing inputs
    #[arg(long, global = true)]
    pub no_input: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create, boot, spread and configure new VMs from the template
    Create(ProvisionArgs),

    /// Clone a golden image and start the clones
    Clone(CloneArgs),
}

/// Inputs shared by both workflows.
#[derive(Debug, Clone, Default, Args)]
pub struct ProvisionArgs {
    /// VM name; repeat to provision several VMs concurrently
    #[arg(short, long = "name", value_name = "NAME")]
    pub names: Vec<String>,

    /// Who the VMs are assigned to
    #[arg(short, long)]
    pub assignee: Option<String>,

    /// Department tag
    #[arg(short, long)]
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct CloneArgs {
    #[command(flatten)]
    pub provision: ProvisionArgs,

    /// UUID of the VM to clone; defaults to vm.clone_source
    #[arg(short, long)]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Progress lines and a human-readable summary
    #[default]
    Text,
    /// A JSON document with one entry per VM
    Json,
}
