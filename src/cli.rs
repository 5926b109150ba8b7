//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{EntryType, InfoFormat};

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "chezdeck",
    about = "Policy-gated front end for the chezmoi dotfile manager",
    version
)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands. Each overrides the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Configuration file (default: $XDG_CONFIG_HOME/chezdeck/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Refuse every operation that changes files or the source repository
    #[arg(long, global = true)]
    pub read_only: bool,

    /// Path to the chezmoi binary
    #[arg(long, global = true)]
    pub binary: Option<PathBuf>,

    /// Per-call timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Managed target root (default: asked from chezmoi)
    #[arg(long, global = true)]
    pub target: Option<PathBuf>,

    /// Editor for edit sessions (default: $VISUAL, then $EDITOR)
    #[arg(long, global = true)]
    pub editor: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show status and source repository state
    Status,
    /// Show the pending diff, for one path or everything
    Diff(PathArg),
    /// List managed entries
    Managed(ManagedOpts),
    /// List ignored entries
    Ignored,
    /// List unmanaged files under the given paths
    Unmanaged(UnmanagedOpts),
    /// Show configuration, template data or diagnostics
    Info(InfoOpts),
    /// Check that the destination matches the target state
    Verify,
    /// Add a file to the source state
    Add(AddOpts),
    /// Copy modified destination files back to the source state
    ReAdd(PathArg),
    /// Stop managing a file
    Forget(RequiredPathArg),
    /// Run git in the source repository
    Git(GitOpts),
    /// Apply the target state to the destination
    Apply(ApplyOpts),
    /// Pull the source repository and apply
    Update,
    /// Initialise chezmoi or regenerate its config
    Init(InitOpts),
    /// Edit a managed file, or the source directory when no path is given
    Edit(PathArg),
    /// Edit the chezmoi config file
    EditConfig,
    /// Edit the chezmoi config file template
    EditConfigTemplate,
    /// List the actions available in the current mode
    Commands,
    /// Write a tar.gz archive of the target state
    Archive,
    /// Print shell completions
    Completions(CompletionsOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Diff(_) => "diff",
            Self::Managed(_) => "managed",
            Self::Ignored => "ignored",
            Self::Unmanaged(_) => "unmanaged",
            Self::Info(_) => "info",
            Self::Verify => "verify",
            Self::Add(_) => "add",
            Self::ReAdd(_) => "re-add",
            Self::Forget(_) => "forget",
            Self::Git(_) => "git",
            Self::Apply(_) => "apply",
            Self::Update => "update",
            Self::Init(_) => "init",
            Self::Edit(_) => "edit",
            Self::EditConfig => "edit-config",
            Self::EditConfigTemplate => "edit-config-template",
            Self::Commands => "commands",
            Self::Archive => "archive",
            Self::Completions(_) => "completions",
            Self::Version => "version",
        }
    }
}

/// An optional path argument.
#[derive(Args, Debug, Clone)]
pub struct PathArg {
    /// Target file; omit for every file
    pub path: Option<PathBuf>,
}

/// A required path argument.
#[derive(Args, Debug, Clone)]
pub struct RequiredPathArg {
    /// Target file
    pub path: PathBuf,
}

/// Options for the `managed` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ManagedOpts {
    /// Entry types to include (dirs, files, templates, encrypted, externals, scripts, symlinks, always)
    #[arg(long, value_delimiter = ',')]
    pub include: Vec<EntryType>,

    /// Entry types to exclude
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<EntryType>,
}

/// Options for the `unmanaged` subcommand.
#[derive(Args, Debug, Clone)]
pub struct UnmanagedOpts {
    /// Directories to search; the target root when empty
    pub paths: Vec<PathBuf>,
}

/// Output format for structured views.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormatArg {
    /// JSON
    #[default]
    Json,
    /// YAML
    Yaml,
}

impl From<FormatArg> for InfoFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => Self::Json,
            FormatArg::Yaml => Self::Yaml,
        }
    }
}

/// Options for the `info` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InfoOpts {
    /// View to show: config, full, data or doctor
    pub view: String,

    /// Format for the full and data views
    #[arg(long, value_enum, default_value_t)]
    pub format: FormatArg,
}

/// Options for the `add` subcommand.
#[derive(Args, Debug, Clone)]
pub struct AddOpts {
    /// Absolute path under the target root
    pub path: PathBuf,

    /// Encrypt the file in the source state
    #[arg(long, conflicts_with_all = ["template", "autotemplate"])]
    pub encrypt: bool,

    /// Add the file as a template
    #[arg(long, conflicts_with = "autotemplate")]
    pub template: bool,

    /// Add the file as a template, replacing known values with variables
    #[arg(long)]
    pub autotemplate: bool,

    /// Mark a directory as exact
    #[arg(long)]
    pub exact: bool,

    /// Do not recurse into directories
    #[arg(long)]
    pub no_recursive: bool,
}

/// Options for the `git` subcommand.
#[derive(Args, Debug, Clone)]
pub struct GitOpts {
    /// The git operation to run.
    #[command(subcommand)]
    pub command: GitCommand,
}

/// Git operations on the source repository.
#[derive(Subcommand, Debug, Clone)]
pub enum GitCommand {
    /// Show branch, remote, and staged and unstaged files
    Status,
    /// Show recent commits
    Log,
    /// Show local commits not on the upstream
    Unpushed,
    /// Show upstream commits not merged locally
    Incoming,
    /// Show one commit
    Show {
        /// Abbreviated or full commit hash
        hash: String,
    },
    /// Show the diff of one source file
    Diff {
        /// Path relative to the source directory
        path: PathBuf,
        /// Diff the index instead of the worktree
        #[arg(long)]
        cached: bool,
    },
    /// Stage one file, or everything when no path is given
    Add {
        /// Path relative to the source directory
        path: Option<PathBuf>,
    },
    /// Unstage one file, or everything when no path is given
    Reset {
        /// Path relative to the source directory
        path: Option<PathBuf>,
    },
    /// Discard worktree changes to one file
    Checkout {
        /// Path relative to the source directory
        path: PathBuf,
    },
    /// Undo the last commit, keeping its changes staged
    SoftReset,
    /// Commit staged changes
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },
    /// Push to the upstream
    Push,
    /// Pull from the upstream
    Pull,
    /// Fetch from the upstream
    Fetch,
}

/// Options for the `apply` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ApplyOpts {
    /// Target file; omit to apply everything
    pub path: Option<PathBuf>,

    /// Show what would change without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Re-download externals
    #[arg(long)]
    pub refresh_externals: bool,
}

/// Options for the `init` subcommand.
#[derive(Args, Debug, Clone)]
pub struct InitOpts {
    /// Repository to clone
    pub repo: Option<String>,
}

/// Options for the `completions` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CompletionsOpts {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
