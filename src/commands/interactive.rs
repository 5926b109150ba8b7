//! Subcommands that hand the terminal to chezmoi.
use std::path::Path;
use std::process::Command;

use anyhow::{Context as _, Result, bail};
use tracing::{debug, info};

use crate::cli::ApplyOpts;
use crate::service::Service;

/// Run `cmd` with inherited stdio and wait for it.
///
/// SIGINT is ignored by this process while the child runs, so Ctrl-C reaches
/// chezmoi and its exit status is still reported.
///
/// # Errors
///
/// Returns an error if the child cannot be spawned or exits unsuccessfully.
pub fn run_interactive(mut cmd: Command) -> Result<()> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let args: Vec<_> = cmd
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();
    debug!(program = %program, args = ?args, "running interactive command");

    if let Err(e) = ctrlc::set_handler(|| {}) {
        debug!(error = %e, "could not install interrupt handler");
    }

    let status = cmd
        .status()
        .with_context(|| format!("failed to run {program}"))?;
    if !status.success() {
        match status.code() {
            Some(code) => bail!("{program} {} exited with status {code}", args.join(" ")),
            None => bail!("{program} {} was terminated by a signal", args.join(" ")),
        }
    }
    Ok(())
}

/// Turn an unavailable command into an error explaining why.
fn require(service: &Service, cmd: Option<Command>, action: &str) -> Result<Command> {
    match cmd {
        Some(cmd) => Ok(cmd),
        None if service.policy().is_read_only() => {
            bail!("{action} is not available in read-only mode")
        }
        None => bail!("{action} needs an editor; set $VISUAL, $EDITOR or --editor"),
    }
}

/// `apply [path] [--dry-run] [--refresh-externals]`.
///
/// # Errors
///
/// Returns an error in read-only mode (unless `--dry-run`) or if chezmoi fails.
pub fn apply(service: &Service, opts: &ApplyOpts) -> Result<()> {
    let cmd = match (opts.dry_run, opts.refresh_externals, opts.path.as_deref()) {
        (true, true, _) => service.apply_refresh_dry_run_cmd(),
        (true, false, path) => service.apply_dry_run_cmd(path),
        (false, true, _) => require(service, service.apply_refresh_cmd(), "apply")?,
        (false, false, Some(path)) => require(service, service.apply_cmd(path), "apply")?,
        (false, false, None) => require(service, service.apply_all_cmd(), "apply")?,
    };
    run_interactive(cmd)?;
    if !opts.dry_run {
        info!("applied");
    }
    Ok(())
}

/// `update`.
///
/// # Errors
///
/// Returns an error in read-only mode or if chezmoi fails.
pub fn update(service: &Service) -> Result<()> {
    run_interactive(require(service, service.update_cmd(), "update")?)
}

/// `init [repo]`.
///
/// # Errors
///
/// Returns an error in read-only mode or if chezmoi fails.
pub fn init(service: &Service, repo: Option<&str>) -> Result<()> {
    run_interactive(require(service, service.init_cmd(repo), "init")?)
}

/// `edit [path]`; without a path the source directory is opened.
///
/// # Errors
///
/// Returns an error in read-only mode, without an editor, or if chezmoi fails.
pub fn edit(service: &Service, path: Option<&Path>) -> Result<()> {
    let cmd = match path {
        Some(path) => service.edit_cmd(path),
        None => service.edit_source_cmd(),
    };
    run_interactive(require(service, cmd, "edit")?)
}

/// `edit-config`.
///
/// # Errors
///
/// Returns an error without an editor or if chezmoi fails.
pub fn edit_config(service: &Service) -> Result<()> {
    let Some(cmd) = service.edit_config_cmd() else {
        bail!("edit-config needs an editor; set $VISUAL, $EDITOR or --editor");
    };
    run_interactive(cmd)
}

/// `edit-config-template`.
///
/// # Errors
///
/// Returns an error if chezmoi fails.
pub fn edit_config_template(service: &Service) -> Result<()> {
    run_interactive(service.edit_config_template_cmd())
}
