//! Policy-enforcing facade over the [`Client`].
//!
//! Every mutating method consults the [`Policy`] before the client is
//! touched, so a rejected call never spawns a process. Read-style methods
//! delegate directly. Interactive actions are exposed as `Option<Command>`,
//! with `None` meaning the action is not available in the current mode.
pub mod archive;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use tracing::{debug, info};

use crate::client::{Client, ClientOptions};
use crate::config::{Config, Mode};
use crate::error::{Error, Result};
use crate::exec::{Executor, SystemExecutor};
use crate::policy::{CommandAvailability, Policy};
use crate::types::{
    AddOptions, EntryFilter, FileStatus, GitCommit, GitInfo, GitStatus, InfoContent, InfoFormat,
    InfoRequest, InfoView, StatusSnapshot,
};

/// Orchestration entry point owning a [`Client`] and a [`Policy`].
#[derive(Debug, Clone)]
pub struct Service {
    client: Client,
    policy: Policy,
}

impl Service {
    /// Combine an existing client and policy.
    #[must_use]
    pub const fn new(client: Client, policy: Policy) -> Self {
        Self { client, policy }
    }

    /// Build a service that runs real processes from `config`.
    ///
    /// When no target root is configured it is resolved from
    /// `chezmoi target-path`; failure leaves the root unset.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_executor(config, Arc::new(SystemExecutor))
    }

    /// Like [`from_config`](Self::from_config) with a custom executor.
    #[must_use]
    pub fn from_config_with_executor(config: &Config, executor: Arc<dyn Executor>) -> Self {
        let client = Client::with_executor(ClientOptions::from(config), executor);
        let target = config.target.clone().or_else(|| match client.target_path() {
            Ok(path) => Some(dunce::simplified(&path).to_path_buf()),
            Err(e) => {
                debug!(error = %e, "could not resolve target root");
                None
            }
        });
        debug!(mode = ?config.mode, target = ?target, "service ready");
        Self::new(client, Policy::new(config.mode, target))
    }

    /// The underlying client.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// The policy in force.
    #[must_use]
    pub const fn policy(&self) -> &Policy {
        &self.policy
    }

    /// The configured mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.policy.mode()
    }

    // ------------------------------------------------------------------
    // reads
    // ------------------------------------------------------------------

    /// See [`Client::status`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn status(&self) -> Result<Vec<FileStatus>> {
        self.client.status()
    }

    /// Diff for a single path. See [`Client::diff`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn diff(&self, path: &Path) -> Result<String> {
        self.client.diff(Some(path))
    }

    /// Diff for every managed path.
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn diff_all(&self) -> Result<String> {
        self.client.diff(None)
    }

    /// See [`Client::managed`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn managed(&self, filter: &EntryFilter) -> Result<Vec<String>> {
        self.client.managed(filter)
    }

    /// See [`Client::ignored`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn ignored(&self) -> Result<Vec<String>> {
        self.client.ignored()
    }

    /// See [`Client::unmanaged`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn unmanaged(&self, paths: &[PathBuf]) -> Result<Vec<String>> {
        self.client.unmanaged(paths)
    }

    /// See [`Client::dump_config`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn dump_config(&self, format: InfoFormat) -> Result<String> {
        self.client.dump_config(format)
    }

    /// See [`Client::cat`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn cat(&self, path: &Path) -> Result<String> {
        self.client.cat(path)
    }

    /// See [`Client::cat_config`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn cat_config(&self) -> Result<String> {
        self.client.cat_config()
    }

    /// See [`Client::data`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn data(&self, format: InfoFormat) -> Result<String> {
        self.client.data(format)
    }

    /// See [`Client::doctor`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn doctor(&self) -> Result<String> {
        self.client.doctor()
    }

    /// See [`Client::verify`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn verify(&self) -> Result<bool> {
        self.client.verify()
    }

    /// See [`Client::source_path`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn source_path(&self, path: Option<&Path>) -> Result<PathBuf> {
        self.client.source_path(path)
    }

    /// See [`Client::target_path`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn target_path(&self) -> Result<PathBuf> {
        self.client.target_path()
    }

    /// See [`Client::git_branch_info`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn git_branch_info(&self) -> Result<GitInfo> {
        self.client.git_branch_info()
    }

    /// See [`Client::git_status`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn git_status(&self) -> Result<GitStatus> {
        self.client.git_status()
    }

    /// See [`Client::git_log`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn git_log(&self) -> Result<Vec<GitCommit>> {
        self.client.git_log()
    }

    /// See [`Client::git_log_unpushed`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn git_log_unpushed(&self) -> Result<Vec<GitCommit>> {
        self.client.git_log_unpushed()
    }

    /// See [`Client::git_log_incoming`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn git_log_incoming(&self) -> Result<Vec<GitCommit>> {
        self.client.git_log_incoming()
    }

    /// See [`Client::git_show`].
    ///
    /// # Errors
    ///
    /// Propagates client errors, including invalid hashes.
    pub fn git_show(&self, hash: &str) -> Result<String> {
        self.client.git_show(hash)
    }

    /// See [`Client::git_diff`].
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn git_diff(&self, path: &Path, cached: bool) -> Result<String> {
        self.client.git_diff(path, cached)
    }

    /// See [`Client::git_last_commit`].
    #[must_use]
    pub fn git_last_commit(&self) -> Option<GitCommit> {
        self.client.git_last_commit()
    }

    /// `git fetch`. Fetching only updates remote-tracking refs, so it is
    /// allowed in read-only mode.
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn git_fetch(&self) -> Result<()> {
        self.client.git_fetch()
    }

    // ------------------------------------------------------------------
    // mutations
    // ------------------------------------------------------------------

    /// Add `path` to the source state.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode or when `path` is outside the
    /// target root, a request error for conflicting options, or a client error.
    pub fn add(&self, path: &Path, options: &AddOptions) -> Result<()> {
        self.policy.check_mutation()?;
        self.policy.validate_target_path(path)?;
        self.client.add(path, options)
    }

    /// Re-add one modified file.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn re_add(&self, path: &Path) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.re_add(path)
    }

    /// Re-add every modified file.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn re_add_all(&self) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.re_add_all()
    }

    /// Stop managing `path`.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn forget(&self, path: &Path) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.forget(path)
    }

    /// Stage `path` in the source repository.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn git_add(&self, path: &Path) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.git_add(path)
    }

    /// Stage every change in the source repository.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn git_add_all(&self) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.git_add_all()
    }

    /// Unstage `path`.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn git_reset(&self, path: &Path) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.git_reset(path)
    }

    /// Unstage everything.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn git_reset_all(&self) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.git_reset_all()
    }

    /// Discard working-tree changes to `path`.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn git_checkout_file(&self, path: &Path) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.git_checkout_file(path)
    }

    /// Undo the last commit, keeping its changes staged.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn git_soft_reset(&self) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.git_soft_reset()
    }

    /// Commit the staged changes with `message`.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn git_commit(&self, message: &str) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.git_commit(message)
    }

    /// Push to the upstream remote.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn git_push(&self) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.git_push()
    }

    /// Pull from the upstream remote.
    ///
    /// # Errors
    ///
    /// Returns a policy error in read-only mode, or a client error.
    pub fn git_pull(&self) -> Result<()> {
        self.policy.check_mutation()?;
        self.client.git_pull()
    }

    // ------------------------------------------------------------------
    // interactive commands
    // ------------------------------------------------------------------

    fn writable<F>(&self, build: F) -> Option<Command>
    where
        F: FnOnce(&Client) -> Option<Command>,
    {
        if self.policy.is_read_only() {
            None
        } else {
            build(&self.client)
        }
    }

    /// `chezmoi apply path`.
    #[must_use]
    pub fn apply_cmd(&self, path: &Path) -> Option<Command> {
        self.writable(|c| Some(c.apply_command(Some(path), false, false)))
    }

    /// `chezmoi apply`.
    #[must_use]
    pub fn apply_all_cmd(&self) -> Option<Command> {
        self.writable(|c| Some(c.apply_command(None, false, false)))
    }

    /// `chezmoi apply --refresh-externals`.
    #[must_use]
    pub fn apply_refresh_cmd(&self) -> Option<Command> {
        self.writable(|c| Some(c.apply_command(None, true, false)))
    }

    /// `chezmoi update`.
    #[must_use]
    pub fn update_cmd(&self) -> Option<Command> {
        self.writable(|c| Some(c.update_command()))
    }

    /// `chezmoi init [repo]`.
    #[must_use]
    pub fn init_cmd(&self, repo: Option<&str>) -> Option<Command> {
        self.writable(|c| Some(c.init_command(repo)))
    }

    /// `chezmoi edit path`.
    #[must_use]
    pub fn edit_cmd(&self, path: &Path) -> Option<Command> {
        self.writable(|c| Some(c.edit_command(path)))
    }

    /// `chezmoi edit` on the source directory; also `None` without an editor.
    #[must_use]
    pub fn edit_source_cmd(&self) -> Option<Command> {
        self.writable(Client::edit_source_command)
    }

    /// `chezmoi apply --dry-run -v [path]`. Available in every mode.
    #[must_use]
    pub fn apply_dry_run_cmd(&self, path: Option<&Path>) -> Command {
        self.client.apply_command(path, false, true)
    }

    /// `chezmoi apply --refresh-externals --dry-run -v`. Available in every mode.
    #[must_use]
    pub fn apply_refresh_dry_run_cmd(&self) -> Command {
        self.client.apply_command(None, true, true)
    }

    /// `chezmoi edit-config`; `None` without an editor.
    #[must_use]
    pub fn edit_config_cmd(&self) -> Option<Command> {
        self.client.edit_config_command()
    }

    /// `chezmoi edit-config-template`.
    #[must_use]
    pub fn edit_config_template_cmd(&self) -> Command {
        self.client.edit_config_template_command()
    }

    // ------------------------------------------------------------------
    // aggregates
    // ------------------------------------------------------------------

    /// Status plus git state of the source repository.
    ///
    /// Git fields stay empty in read-only mode or when `git status` fails.
    /// A branch info failure leaves only [`StatusSnapshot::git_info`] empty.
    ///
    /// # Errors
    ///
    /// Returns an error only if `chezmoi status` fails.
    pub fn load_status(&self) -> Result<StatusSnapshot> {
        let mut snapshot = StatusSnapshot {
            files: self.client.status()?,
            ..StatusSnapshot::default()
        };
        if self.policy.is_read_only() {
            return Ok(snapshot);
        }

        match self.client.git_status() {
            Ok(status) => {
                snapshot.staged = status.staged;
                snapshot.unstaged = status.unstaged;
                match self.client.git_branch_info() {
                    Ok(info) => snapshot.git_info = info,
                    Err(e) => debug!(error = %e, "git branch info unavailable"),
                }
            }
            Err(e) => debug!(error = %e, "git status unavailable"),
        }
        Ok(snapshot)
    }

    /// Load one informational view.
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn load_info(&self, request: InfoRequest) -> Result<InfoContent> {
        let content = match request.view {
            InfoView::Config => self.client.cat_config()?,
            InfoView::Full => self.client.dump_config(request.format)?,
            InfoView::Data => self.client.data(request.format)?,
            InfoView::Doctor => self.client.doctor()?,
        };
        Ok(InfoContent {
            view: Some(request.view),
            format: request.format,
            content,
        })
    }

    /// Load a view by name. Unknown names yield empty content without
    /// invoking anything.
    ///
    /// # Errors
    ///
    /// Propagates client errors.
    pub fn load_info_named(&self, name: &str, format: InfoFormat) -> Result<InfoContent> {
        match InfoView::parse(name) {
            Some(view) => self.load_info(InfoRequest { view, format }),
            None => {
                debug!(view = name, "unknown info view");
                Ok(InfoContent {
                    view: None,
                    format,
                    content: String::new(),
                })
            }
        }
    }

    /// Write a tar.gz of the target state to the archive directory and
    /// return its path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the directory cannot be created, or a client
    /// error.
    pub fn archive(&self) -> Result<PathBuf> {
        self.archive_into(&archive::archive_dir())
    }

    /// Like [`archive`](Self::archive), writing into `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `dir` cannot be created, or a client error.
    pub fn archive_into(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir).map_err(|source| Error::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = archive::archive_path_in(dir, chrono::Local::now().naive_local());
        self.client.archive(&path)?;
        info!(path = %path.display(), "archive written");
        Ok(path)
    }

    /// The command catalogue for the current mode and editor availability.
    #[must_use]
    pub fn available_commands(&self) -> Vec<CommandAvailability> {
        let has_edit_source = self.client.edit_source_command().is_some();
        let has_edit_config = self.client.edit_config_command().is_some();
        self.policy
            .available_commands(has_edit_source, has_edit_config)
    }
}
