//! `git` subcommands on the source repository.
use std::fmt::Write as _;

use anyhow::Result;
use serde::Serialize;

use super::Output;
use super::query::render_git_files;
use crate::cli::GitCommand;
use crate::service::Service;
use crate::types::{GitCommit, GitInfo, GitStatus};

/// Branch and working tree state, as printed by `git status`.
#[derive(Debug, Serialize)]
struct RepoState {
    #[serde(flatten)]
    info: GitInfo,
    #[serde(flatten)]
    status: GitStatus,
    last_commit: Option<GitCommit>,
}

/// Run one git subcommand.
///
/// # Errors
///
/// Returns an error if the operation is refused or git fails.
pub fn run(service: &Service, command: &GitCommand, out: Output) -> Result<()> {
    match command {
        GitCommand::Status => {
            let state = RepoState {
                info: service.git_branch_info()?,
                status: service.git_status()?,
                last_commit: service.git_last_commit(),
            };
            out.emit(&state, render_state)
        }
        GitCommand::Log => out.emit(&service.git_log()?, |c| render_commits(c)),
        GitCommand::Unpushed => out.emit(&service.git_log_unpushed()?, |c| render_commits(c)),
        GitCommand::Incoming => out.emit(&service.git_log_incoming()?, |c| render_commits(c)),
        GitCommand::Show { hash } => out.raw(&service.git_show(hash)?),
        GitCommand::Diff { path, cached } => out.raw(&service.git_diff(path, *cached)?),
        GitCommand::Add { path: Some(path) } => {
            service.git_add(path)?;
            out.done(&format!("staged {}", path.display()))
        }
        GitCommand::Add { path: None } => {
            service.git_add_all()?;
            out.done("staged all changes")
        }
        GitCommand::Reset { path: Some(path) } => {
            service.git_reset(path)?;
            out.done(&format!("unstaged {}", path.display()))
        }
        GitCommand::Reset { path: None } => {
            service.git_reset_all()?;
            out.done("unstaged all changes")
        }
        GitCommand::Checkout { path } => {
            service.git_checkout_file(path)?;
            out.done(&format!("discarded changes to {}", path.display()))
        }
        GitCommand::SoftReset => {
            service.git_soft_reset()?;
            out.done("undid the last commit; its changes are staged")
        }
        GitCommand::Commit { message } => {
            service.git_commit(message)?;
            out.done("committed")
        }
        GitCommand::Push => {
            service.git_push()?;
            out.done("pushed")
        }
        GitCommand::Pull => {
            service.git_pull()?;
            out.done("pulled")
        }
        GitCommand::Fetch => {
            service.git_fetch()?;
            out.done("fetched")
        }
    }
}

fn render_state(state: &RepoState) -> String {
    let mut text = format!("branch {}", state.info.branch);
    if !state.info.remote.is_empty() {
        let _ = write!(text, " ({})", state.info.remote);
    }
    let _ = writeln!(
        text,
        " ahead {} behind {}",
        state.info.ahead, state.info.behind
    );
    if let Some(commit) = &state.last_commit {
        let _ = writeln!(text, "last commit {} {}", commit.hash, commit.message);
    }
    render_git_files(&mut text, "staged", &state.status.staged);
    render_git_files(&mut text, "unstaged", &state.status.unstaged);
    text
}

fn render_commits(commits: &[GitCommit]) -> String {
    commits
        .iter()
        .map(|c| format!("{} {}", c.hash, c.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::types::GitFile;

    #[test]
    fn state_renders_branch_commit_and_files() {
        let state = RepoState {
            info: GitInfo {
                branch: "main".to_string(),
                remote: String::new(),
                ahead: 0,
                behind: 2,
            },
            status: GitStatus {
                staged: Vec::new(),
                unstaged: vec![GitFile {
                    path: "dot_new".to_string(),
                    status_code: 'U',
                }],
            },
            last_commit: Some(GitCommit {
                hash: "abc1234".to_string(),
                message: "Tweak prompt".to_string(),
            }),
        };
        let text = render_state(&state);
        assert!(text.starts_with("branch main ahead 0 behind 2\n"), "{text}");
        assert!(text.contains("last commit abc1234 Tweak prompt"));
        assert!(text.contains("unstaged:\n  U dot_new"));
    }

    #[test]
    fn state_serializes_flat() {
        let state = RepoState {
            info: GitInfo::default(),
            status: GitStatus::default(),
            last_commit: None,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("branch").is_some());
        assert!(json.get("staged").is_some());
        assert!(json.get("last_commit").unwrap().is_null());
    }

    #[test]
    fn commits_render_one_per_line() {
        let commits = vec![
            GitCommit {
                hash: "a1".to_string(),
                message: "one".to_string(),
            },
            GitCommit {
                hash: "b2".to_string(),
                message: "two".to_string(),
            },
        ];
        assert_eq!(render_commits(&commits), "a1 one\nb2 two");
    }
}
