//! Read-only subcommands.
use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::Output;
use crate::cli::{InfoOpts, ManagedOpts};
use crate::policy::{Category, CommandAvailability};
use crate::service::Service;
use crate::types::{EntryFilter, GitFile, StatusSnapshot};

/// `status`: chezmoi status plus the source repository state.
///
/// # Errors
///
/// Returns an error if `chezmoi status` fails.
pub fn status(service: &Service, out: Output) -> Result<()> {
    let snapshot = service.load_status()?;
    out.emit(&snapshot, render_status)
}

/// `diff [path]`.
///
/// # Errors
///
/// Returns an error if chezmoi reports a failure.
pub fn diff(service: &Service, path: Option<&Path>, out: Output) -> Result<()> {
    let diff = match path {
        Some(path) => service.diff(path)?,
        None => service.diff_all()?,
    };
    out.raw(&diff)
}

/// `managed [--include ...] [--exclude ...]`.
///
/// # Errors
///
/// Returns an error if chezmoi fails.
pub fn managed(service: &Service, opts: &ManagedOpts, out: Output) -> Result<()> {
    let filter = EntryFilter {
        include: opts.include.iter().copied().collect::<BTreeSet<_>>(),
        exclude: opts.exclude.iter().copied().collect::<BTreeSet<_>>(),
    };
    let entries = service.managed(&filter)?;
    out.emit(&entries, |e| e.join("\n"))
}

/// `ignored`.
///
/// # Errors
///
/// Returns an error if chezmoi fails.
pub fn ignored(service: &Service, out: Output) -> Result<()> {
    let entries = service.ignored()?;
    out.emit(&entries, |e| e.join("\n"))
}

/// `unmanaged [paths...]`.
///
/// # Errors
///
/// Returns an error if chezmoi fails.
pub fn unmanaged(service: &Service, paths: &[PathBuf], out: Output) -> Result<()> {
    let entries = service.unmanaged(paths)?;
    out.emit(&entries, |e| e.join("\n"))
}

/// `info <view>`.
///
/// # Errors
///
/// Returns an error if chezmoi fails or the view name is unknown.
pub fn info(service: &Service, opts: &InfoOpts, out: Output) -> Result<()> {
    let content = service.load_info_named(&opts.view, opts.format.into())?;
    if content.view.is_none() {
        anyhow::bail!(
            "unknown info view '{}' (expected config, full, data or doctor)",
            opts.view
        );
    }
    out.emit(&content, |c| c.content.clone())
}

/// `verify`: exit status reflects whether the destination is in sync.
///
/// # Errors
///
/// Returns an error if chezmoi fails or the destination differs.
pub fn verify(service: &Service, out: Output) -> Result<()> {
    if service.verify()? {
        out.done("destination matches the target state")
    } else {
        anyhow::bail!("destination differs from the target state; run `chezdeck diff`")
    }
}

/// `commands`: the action catalogue for the current mode.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn commands(service: &Service, out: Output) -> Result<()> {
    let catalogue = service.available_commands();
    out.emit(catalogue.as_slice(), render_catalogue)
}

/// `archive`.
///
/// # Errors
///
/// Returns an error if the archive directory cannot be created or chezmoi
/// fails.
pub fn archive(service: &Service, out: Output) -> Result<()> {
    let path = service.archive()?;
    out.done(&format!("archive written to {}", path.display()))
}

/// Plain-text rendering of a [`StatusSnapshot`].
#[must_use]
pub fn render_status(snapshot: &StatusSnapshot) -> String {
    let mut text = String::new();
    if snapshot.files.is_empty() {
        text.push_str("nothing to apply\n");
    }
    for file in &snapshot.files {
        let _ = writeln!(
            text,
            "{}{} {}  ({})",
            file.source_status,
            file.dest_status,
            file.path,
            file.side_label()
        );
    }

    let info = &snapshot.git_info;
    if !info.branch.is_empty() {
        let _ = write!(text, "\nbranch {}", info.branch);
        if !info.remote.is_empty() {
            let _ = write!(text, " ({})", info.remote);
        }
        if info.ahead > 0 || info.behind > 0 {
            let _ = write!(text, " ahead {} behind {}", info.ahead, info.behind);
        }
        text.push('\n');
    }
    render_git_files(&mut text, "staged", &snapshot.staged);
    render_git_files(&mut text, "unstaged", &snapshot.unstaged);
    text
}

pub(super) fn render_git_files(text: &mut String, heading: &str, files: &[GitFile]) {
    if files.is_empty() {
        return;
    }
    let _ = writeln!(text, "{heading}:");
    for file in files {
        let _ = writeln!(text, "  {} {}", file.status_code, file.path);
    }
}

/// Plain-text rendering of the command catalogue, grouped by category.
#[must_use]
pub fn render_catalogue(commands: &[CommandAvailability]) -> String {
    let mut text = String::new();
    let mut current = None;
    for command in commands {
        if current != Some(command.category) {
            let heading = match command.category {
                Category::Apply => "Apply",
                Category::Info => "Info",
                Category::Edit => "Edit",
            };
            if current.is_some() {
                text.push('\n');
            }
            let _ = writeln!(text, "{heading}:");
            current = Some(command.category);
        }
        let mut flags = String::new();
        if command.supports_dry_run {
            flags.push_str(" [dry-run]");
        }
        if !command.available {
            flags.push_str(" [unavailable]");
        }
        let _ = writeln!(
            text,
            "  {:<22}{}{flags}",
            command.label, command.description
        );
    }
    text
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::{FileStatus, GitInfo};

    #[test]
    fn render_status_lists_files_and_git_state() {
        let snapshot = StatusSnapshot {
            files: vec![FileStatus {
                path: "/home/u/.bashrc".to_string(),
                source_status: ' ',
                dest_status: 'M',
            }],
            staged: vec![GitFile {
                path: "dot_bashrc".to_string(),
                status_code: 'M',
            }],
            unstaged: Vec::new(),
            git_info: GitInfo {
                branch: "main".to_string(),
                remote: "origin".to_string(),
                ahead: 1,
                behind: 0,
            },
        };
        let text = render_status(&snapshot);
        assert!(text.contains(" M /home/u/.bashrc  (pending apply)"), "{text}");
        assert!(text.contains("branch main (origin) ahead 1 behind 0"), "{text}");
        assert!(text.contains("staged:\n  M dot_bashrc"), "{text}");
        assert!(!text.contains("unstaged"));
    }

    #[test]
    fn render_status_empty() {
        let text = render_status(&StatusSnapshot::default());
        assert_eq!(text, "nothing to apply\n");
    }

    #[test]
    fn render_catalogue_groups_by_category() {
        let policy = crate::policy::Policy::new(crate::config::Mode::ReadOnly, None);
        let text = render_catalogue(&policy.available_commands(false, false));
        assert!(text.starts_with("Info:\n"), "{text}");
        assert!(text.contains("\nEdit:\n"));
        assert!(text.contains("Edit Config Template"));
        assert!(text.contains("[unavailable]"));
    }
}
