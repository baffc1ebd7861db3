use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "extsync")]
#[command(about = "extsync: keep local extensions and their remote registrations in step")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// App API key (overrides config and project)
    #[arg(long, global = true, env = "EXTSYNC_API_KEY")]
    pub api_key: Option<String>,

    /// Registry state file
    #[arg(long, global = true, env = "EXTSYNC_STATE")]
    pub state: Option<PathBuf>,

    /// Config profile name
    #[arg(short, long, global = true, env = "EXTSYNC_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log decisions at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show what a deploy would match and create
    Plan(PlanArgs),
    /// Match, create missing registrations and print identifiers
    Deploy(DeployArgs),
    /// List known extension types
    Types,
    /// Manage CLI configuration
    Config(ConfigArgs),
}

#[derive(clap::Args)]
pub struct PlanArgs {
    /// Project snapshot (JSON)
    #[arg(long, default_value = "extsync.json")]
    pub project: PathBuf,
    /// Accept every prompt
    #[arg(short, long)]
    pub yes: bool,
}

#[derive(clap::Args)]
pub struct DeployArgs {
    /// Project snapshot (JSON)
    #[arg(long, default_value = "extsync.json")]
    pub project: PathBuf,
    /// Skip the final deploy confirmation
    #[arg(long)]
    pub force: bool,
    /// Accept every prompt
    #[arg(short, long)]
    pub yes: bool,
    /// Reconcile configuration-managed and multi-instance sources
    #[arg(long)]
    pub include_config: bool,
    /// Reconcile configuration sources as drafts
    #[arg(long)]
    pub draft: bool,
    /// Mark the deploy as a release
    #[arg(long)]
    pub release: bool,
    /// Store the resulting identifiers back into the project snapshot
    #[arg(long)]
    pub write_identifiers: bool,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (api_key, state, match_key, include_config_on_deploy, log_level, format)
    pub key: String,
    /// Value
    pub value: String,
}
