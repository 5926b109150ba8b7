//! Typed wrapper around the chezmoi binary.
//!
//! The client knows how to build invocations and interpret their output; it
//! makes no policy decisions. Non-interactive calls go through an
//! [`Executor`] with a fixed set of baseline flags and a deadline.
//! Interactive calls are returned as unexecuted [`Command`]s for the caller
//! to run with an attached terminal.
mod chezmoi;
mod git;

pub use git::LOG_LIMIT;

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, DEFAULT_TIMEOUT};
use crate::error::{ExecError, Result};
use crate::exec::{self, ExecResult, Executor, Invocation, SystemExecutor};

/// Name of the external tool on `PATH`.
pub const DEFAULT_BINARY: &str = "chezmoi";

/// Flags prefixed to every non-interactive invocation so output is plain,
/// unpaged, and identical regardless of the user's terminal or chezmoi
/// configuration.
pub const BASELINE_FLAGS: [&str; 5] = [
    "--no-tty",
    "--color=false",
    "--no-pager",
    "--progress=false",
    "--use-builtin-diff",
];

/// Environment for non-interactive invocations; keeps git from paging or
/// prompting for credentials.
const BASELINE_ENV: [(&str, &str); 2] = [("GIT_PAGER", "cat"), ("GIT_TERMINAL_PROMPT", "0")];

/// Prefixes of output lines that indicate a real failure rather than
/// informational output on a non-zero exit.
const ERROR_PREFIXES: [&str; 4] = ["chezmoi:", "error", "fatal:", "usage:"];

/// Construction options for [`Client`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    /// Path to the binary; resolved on `PATH` when `None`.
    pub binary: Option<PathBuf>,
    /// Per-call deadline; 30 seconds when `None`.
    pub timeout: Option<Duration>,
    /// Editor overriding `$VISUAL` / `$EDITOR` for edit sessions.
    pub editor: Option<String>,
}

impl From<&Config> for ClientOptions {
    fn from(config: &Config) -> Self {
        Self {
            binary: config.binary.clone(),
            timeout: Some(config.timeout()),
            editor: config.editor.clone(),
        }
    }
}

/// Client for the chezmoi command-line tool.
#[derive(Clone)]
pub struct Client {
    binary: PathBuf,
    timeout: Duration,
    editor: Option<String>,
    executor: Arc<dyn Executor>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("binary", &self.binary)
            .field("timeout", &self.timeout)
            .field("editor", &self.editor)
            .field("executor", &"<dyn Executor>")
            .finish()
    }
}

impl Client {
    /// Create a client that runs real processes.
    #[must_use]
    pub fn new(options: ClientOptions) -> Self {
        Self::with_executor(options, Arc::new(SystemExecutor))
    }

    /// Create a client backed by a custom executor.
    #[must_use]
    pub fn with_executor(options: ClientOptions, executor: Arc<dyn Executor>) -> Self {
        let binary = options.binary.unwrap_or_else(|| {
            exec::resolve(DEFAULT_BINARY).unwrap_or_else(|| PathBuf::from(DEFAULT_BINARY))
        });
        Self {
            binary,
            timeout: options.timeout.unwrap_or(DEFAULT_TIMEOUT),
            editor: options.editor.filter(|e| !e.trim().is_empty()),
            executor,
        }
    }

    /// The binary this client invokes.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// The per-call deadline.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    // ------------------------------------------------------------------
    // invocation plumbing
    // ------------------------------------------------------------------

    /// Build a non-interactive invocation: baseline flags, then `args`.
    fn invocation<I, S>(&self, label: &str, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args = BASELINE_FLAGS
            .iter()
            .map(|f| (*f).to_string())
            .chain(args.into_iter().map(Into::into))
            .collect();
        Invocation {
            label: label.to_string(),
            program: self.binary.clone(),
            args,
            env: BASELINE_ENV
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            timeout: self.timeout,
        }
    }

    /// Run without judging the exit code.
    fn run_unchecked<I, S>(&self, label: &str, args: I) -> Result<ExecResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = self.invocation(label, args);
        Ok(self.executor.execute(&invocation)?)
    }

    /// Run and fail on a non-zero exit.
    fn run<I, S>(&self, label: &str, args: I) -> Result<ExecResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let result = self.run_unchecked(label, args)?;
        if result.success {
            Ok(result)
        } else {
            Err(failed(label, &result).into())
        }
    }

    /// Run and return combined output, accepting a non-zero exit when the
    /// output is non-empty and does not look like an error.
    fn run_lenient<I, S>(&self, label: &str, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let result = self.run_unchecked(label, args)?;
        let output = result.combined();
        if result.success || (!output.trim().is_empty() && !looks_like_error(&output)) {
            if !result.success {
                tracing::debug!(subcommand = label, code = ?result.code, "accepting output from non-zero exit");
            }
            Ok(output)
        } else {
            Err(failed(label, &result).into())
        }
    }

    // ------------------------------------------------------------------
    // interactive commands
    // ------------------------------------------------------------------

    /// Build a TTY-attached command. No baseline flags are added.
    fn interactive<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args);
        cmd
    }

    /// Like [`interactive`](Self::interactive), exporting the editor override.
    fn interactive_editor<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = self.interactive(args);
        if let Some(editor) = &self.editor {
            cmd.env("EDITOR", editor).env("VISUAL", editor);
        }
        cmd
    }

    /// The editor an edit session would use: override, `$VISUAL`, `$EDITOR`.
    #[must_use]
    pub fn editor(&self) -> Option<String> {
        self.editor.clone().or_else(|| {
            ["VISUAL", "EDITOR"]
                .into_iter()
                .filter_map(|var| std::env::var(var).ok())
                .find(|v| !v.trim().is_empty())
        })
    }

    /// Return `true` if the resolved editor's program can be found.
    #[must_use]
    pub fn has_editor(&self) -> bool {
        self.editor()
            .as_deref()
            .and_then(|e| e.split_whitespace().next())
            .is_some_and(|program| self.executor.which(program))
    }

    /// `chezmoi apply [--refresh-externals] [--dry-run -v] [path]`.
    #[must_use]
    pub fn apply_command(&self, path: Option<&Path>, refresh_externals: bool, dry_run: bool) -> Command {
        let mut cmd = self.interactive(["apply"]);
        if refresh_externals {
            cmd.arg("--refresh-externals");
        }
        if dry_run {
            cmd.args(["--dry-run", "-v"]);
        }
        if let Some(path) = path {
            cmd.arg(path);
        }
        cmd
    }

    /// `chezmoi update`.
    #[must_use]
    pub fn update_command(&self) -> Command {
        self.interactive(["update"])
    }

    /// `chezmoi init [repo]`.
    #[must_use]
    pub fn init_command(&self, repo: Option<&str>) -> Command {
        let mut cmd = self.interactive(["init"]);
        if let Some(repo) = repo {
            cmd.arg(repo);
        }
        cmd
    }

    /// `chezmoi edit path`.
    #[must_use]
    pub fn edit_command(&self, path: &Path) -> Command {
        let mut cmd = self.interactive_editor(["edit"]);
        cmd.arg(path);
        cmd
    }

    /// `chezmoi edit` with no target, which opens the source directory.
    ///
    /// Returns `None` when no editor is available.
    #[must_use]
    pub fn edit_source_command(&self) -> Option<Command> {
        self.has_editor().then(|| self.interactive_editor(["edit"]))
    }

    /// `chezmoi edit-config`. Returns `None` when no editor is available.
    #[must_use]
    pub fn edit_config_command(&self) -> Option<Command> {
        self.has_editor()
            .then(|| self.interactive_editor(["edit-config"]))
    }

    /// `chezmoi edit-config-template`.
    #[must_use]
    pub fn edit_config_template_command(&self) -> Command {
        self.interactive_editor(["edit-config-template"])
    }
}

/// Build the failure error for `label`, carrying trimmed combined output.
fn failed(label: &str, result: &ExecResult) -> ExecError {
    ExecError::Failed {
        subcommand: label.to_string(),
        code: result.code,
        output: result.combined().trim().to_string(),
    }
}

/// Return `true` if the first non-blank line reads like an error message.
fn looks_like_error(output: &str) -> bool {
    output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .is_some_and(|first| {
            let first = first.to_ascii_lowercase();
            ERROR_PREFIXES.iter().any(|p| first.starts_with(p))
        })
}

/// Convert a path argument to a string for an invocation.
fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
