//! Clap derive structures for the `vmanly` CLI.
//!
//! Defines the command tree, global flags, and shared value enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vmanly -- declarative template and policy sync for vManage
#[derive(Debug, Parser)]
#[command(
    name = "vmanly",
    version,
    about = "Export and import vManage templates and policies",
    long_about = "Keeps policy lists, definitions, policies, feature templates and\n\
        device templates in a name-only document and syncs that document\n\
        against a vManage controller.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Controller profile to use
    #[arg(long, short = 'p', env = "VMANLY_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Controller URL (overrides profile)
    #[arg(long, short = 'c', env = "VMANLY_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Username (overrides profile)
    #[arg(long, short = 'u', env = "VMANLY_USERNAME", global = true)]
    pub username: Option<String>,

    /// Password; read from VMANLY_PASSWORD only
    #[arg(
        long,
        env = "VMANLY_PASSWORD",
        global = true,
        hide = true,
        hide_env_values = true
    )]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VMANLY_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VMANLY_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "VMANLY_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

/// Entity kinds, in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    /// Policy lists (sites, prefixes, VPNs, ...)
    Lists,
    /// Policy definitions
    Definitions,
    /// Centralized (vSmart) policies
    CentralPolicies,
    /// Localized (vEdge) policies
    LocalPolicies,
    /// Security policies
    SecurityPolicies,
    /// Feature templates
    FeatureTemplates,
    /// Device templates
    DeviceTemplates,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Export controller objects to a name-only document
    #[command(alias = "ex")]
    Export(ExportArgs),

    /// Sync a document into the controller
    #[command(alias = "im")]
    Import(ImportArgs),

    /// List controller objects of one kind
    #[command(alias = "ls")]
    List(ListArgs),

    /// Re-push a device template to every device it is attached to
    Reattach(ReattachArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Export / Import ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Output document (.yaml/.yml for YAML, JSON otherwise)
    pub file: PathBuf,

    /// Restrict to these kinds
    #[arg(long, value_enum, value_delimiter = ',')]
    pub only: Vec<KindArg>,

    /// Include built-in lists, definitions and factory-default templates
    #[arg(long)]
    pub include_defaults: bool,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Input document (.yaml/.yml for YAML, JSON otherwise)
    pub file: PathBuf,

    /// Restrict to these kinds
    #[arg(long, value_enum, value_delimiter = ',')]
    pub only: Vec<KindArg>,

    /// Report what would change without writing anything
    #[arg(long)]
    pub check: bool,

    /// Update objects that already exist and differ
    #[arg(long)]
    pub update: bool,

    /// Reattach device templates affected by an update
    #[arg(long, requires = "update")]
    pub push: bool,

    /// Print field-level differences
    #[arg(long)]
    pub diff: bool,

    /// Continue with the next object after a failure
    #[arg(long)]
    pub keep_going: bool,
}

// ── List / Reattach ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Kind of object to list
    #[arg(value_enum)]
    pub kind: KindArg,
}

#[derive(Debug, Args)]
pub struct ReattachArgs {
    /// Device template name
    pub template: String,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Profile key (controller, username, password_env, ca_cert,
        /// insecure, timeout, poll_interval_secs, poll_max_attempts)
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
