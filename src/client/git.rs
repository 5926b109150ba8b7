//! Git passthrough: `chezmoi git -- <args>` runs git in the source directory.
use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Client, arg};
use crate::error::{Error, ExecError, RequestError, Result};
use crate::exec::ExecResult;
use crate::parse;
use crate::types::{GitCommit, GitInfo, GitStatus};

/// Number of commits shown by [`Client::git_log`].
pub const LOG_LIMIT: usize = 20;

/// Failure text meaning "there is no upstream to compare against".
const NO_UPSTREAM_MARKERS: [&str; 4] = [
    "no upstream configured",
    "unknown revision",
    "no upstream branch",
    "bad revision",
];

impl Client {
    fn git<I, S>(&self, label: &str, git_args: I) -> Result<ExecResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(label, git_argv(git_args))
    }

    fn git_unchecked<I, S>(&self, label: &str, git_args: I) -> Result<ExecResult>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_unchecked(label, git_argv(git_args))
    }

    fn git_lenient<I, S>(&self, label: &str, git_args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run_lenient(label, git_argv(git_args))
    }

    /// Top level of the source repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the source directory is not a git repository.
    pub fn git_repo_root(&self) -> Result<PathBuf> {
        let result = self.git("git rev-parse", ["rev-parse", "--show-toplevel"])?;
        Ok(PathBuf::from(result.stdout.trim()))
    }

    /// Current branch name (`HEAD` when detached).
    ///
    /// # Errors
    ///
    /// Returns an error if git cannot resolve `HEAD`.
    pub fn git_branch(&self) -> Result<String> {
        let result = self.git("git rev-parse", ["rev-parse", "--abbrev-ref", "HEAD"])?;
        Ok(result.stdout.trim().to_string())
    }

    /// First configured remote, or empty when there is none or git fails.
    #[must_use]
    pub fn git_remote(&self) -> String {
        match self.git("git remote", ["remote"]) {
            Ok(result) => result
                .stdout
                .lines()
                .map(str::trim)
                .find(|l| !l.is_empty())
                .unwrap_or_default()
                .to_string(),
            Err(e) => {
                debug!(error = %e, "remote lookup failed");
                String::new()
            }
        }
    }

    /// `(ahead, behind)` relative to the upstream, or zeros when unknown.
    #[must_use]
    pub fn git_ahead_behind(&self) -> (u32, u32) {
        let counts = self
            .git(
                "git rev-list",
                ["rev-list", "--left-right", "--count", "@{upstream}...HEAD"],
            )
            .map(|result| parse::parse_ahead_behind(&result.stdout));
        match counts {
            Ok(Some(counts)) => counts,
            Ok(None) => (0, 0),
            Err(e) => {
                debug!(error = %e, "ahead/behind lookup failed");
                (0, 0)
            }
        }
    }

    /// Branch, remote, and divergence. Only the branch lookup can fail; the
    /// other fields fall back to empty or zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the branch cannot be resolved.
    pub fn git_branch_info(&self) -> Result<GitInfo> {
        let branch = self.git_branch()?;
        let remote = self.git_remote();
        let (ahead, behind) = self.git_ahead_behind();
        Ok(GitInfo {
            branch,
            remote,
            ahead,
            behind,
        })
    }

    /// `git status --porcelain -u`.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_status(&self) -> Result<GitStatus> {
        let result = self.git("git status", ["status", "--porcelain", "-u"])?;
        Ok(parse::parse_porcelain(&result.stdout))
    }

    /// `git add -- path`.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_add(&self, path: &Path) -> Result<()> {
        self.git("git add", ["add".to_string(), "--".to_string(), arg(path)])?;
        Ok(())
    }

    /// `git add -A`.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_add_all(&self) -> Result<()> {
        self.git("git add", ["add", "-A"])?;
        Ok(())
    }

    /// `git reset HEAD -- path`: unstage one file.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_reset(&self, path: &Path) -> Result<()> {
        self.git(
            "git reset",
            ["reset".to_string(), "HEAD".to_string(), "--".to_string(), arg(path)],
        )?;
        Ok(())
    }

    /// `git reset HEAD`: unstage everything.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_reset_all(&self) -> Result<()> {
        self.git("git reset", ["reset", "HEAD"])?;
        Ok(())
    }

    /// `git reset --soft HEAD~1`: undo the last commit, keeping its changes staged.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_soft_reset(&self) -> Result<()> {
        self.git("git reset", ["reset", "--soft", "HEAD~1"])?;
        Ok(())
    }

    /// `git checkout -- path`: discard worktree changes to one file.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_checkout_file(&self, path: &Path) -> Result<()> {
        self.git(
            "git checkout",
            ["checkout".to_string(), "--".to_string(), arg(path)],
        )?;
        Ok(())
    }

    /// `git commit -m message`. Committing with nothing staged is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails for any other reason.
    pub fn git_commit(&self, message: &str) -> Result<()> {
        let result = self.git_unchecked("git commit", ["commit", "-m", message])?;
        if result.success {
            return Ok(());
        }
        if result.combined().contains("nothing to commit") {
            debug!("nothing to commit");
            return Ok(());
        }
        Err(super::failed("git commit", &result).into())
    }

    /// `git push`.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_push(&self) -> Result<()> {
        self.git("git push", ["push"])?;
        Ok(())
    }

    /// `git pull`.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_pull(&self) -> Result<()> {
        self.git("git pull", ["pull"])?;
        Ok(())
    }

    /// `git fetch`.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_fetch(&self) -> Result<()> {
        self.git("git fetch", ["fetch"])?;
        Ok(())
    }

    /// The most recent [`LOG_LIMIT`] commits.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails.
    pub fn git_log(&self) -> Result<Vec<GitCommit>> {
        let limit = format!("-{LOG_LIMIT}");
        let result = self.git("git log", ["log", "--oneline", limit.as_str()])?;
        Ok(parse::parse_log(&result.stdout))
    }

    /// The last commit, or `None` when there is none or git fails.
    #[must_use]
    pub fn git_last_commit(&self) -> Option<GitCommit> {
        match self.git("git log", ["log", "--oneline", "-1"]) {
            Ok(result) => parse::parse_log(&result.stdout).into_iter().next(),
            Err(e) => {
                debug!(error = %e, "last commit lookup failed");
                None
            }
        }
    }

    /// Local commits not yet on the upstream. Empty when no upstream exists.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails for a reason other than a missing upstream.
    pub fn git_log_unpushed(&self) -> Result<Vec<GitCommit>> {
        self.git_log_range("@{upstream}..HEAD")
    }

    /// Upstream commits not yet merged locally. Empty when no upstream exists.
    ///
    /// # Errors
    ///
    /// Returns an error if git fails for a reason other than a missing upstream.
    pub fn git_log_incoming(&self) -> Result<Vec<GitCommit>> {
        self.git_log_range("HEAD..@{upstream}")
    }

    fn git_log_range(&self, range: &str) -> Result<Vec<GitCommit>> {
        match self.git("git log", ["log", "--oneline", range]) {
            Ok(result) => Ok(parse::parse_log(&result.stdout)),
            Err(e) if is_no_upstream(&e) => {
                debug!(range, "no upstream configured");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// `git show --format=fuller hash`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::InvalidHash`] without spawning anything if
    /// `hash` is not 4–64 hex digits, or an error if git fails.
    pub fn git_show(&self, hash: &str) -> Result<String> {
        if !parse::is_valid_hash(hash) {
            return Err(RequestError::InvalidHash(hash.to_string()).into());
        }
        self.git_lenient("git show", ["show", "--format=fuller", hash])
    }

    /// `git diff [--cached] -- path`.
    ///
    /// # Errors
    ///
    /// Returns an error if git reports a real failure.
    pub fn git_diff(&self, path: &Path, cached: bool) -> Result<String> {
        let mut args = vec!["diff".to_string()];
        if cached {
            args.push("--cached".to_string());
        }
        args.push("--".to_string());
        args.push(arg(path));
        self.git_lenient("git diff", args)
    }
}

/// `git -- <args>` as chezmoi arguments.
fn git_argv<I, S>(git_args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ["git".to_string(), "--".to_string()]
        .into_iter()
        .chain(git_args.into_iter().map(Into::into))
        .collect()
}

/// Return `true` if `err` is a git failure caused by a missing upstream.
fn is_no_upstream(err: &Error) -> bool {
    match err {
        Error::Exec(ExecError::Failed { output, .. }) => {
            let output = output.to_ascii_lowercase();
            NO_UPSTREAM_MARKERS.iter().any(|m| output.contains(m))
        }
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::super::tests::client;
    use super::*;
    use crate::exec::test_helpers::MockExecutor;
    use std::sync::Arc;

    fn call(mock: &MockExecutor, n: usize) -> Vec<String> {
        mock.call_args()[n][super::super::BASELINE_FLAGS.len()..].to_vec()
    }

    #[test]
    fn git_args_follow_separator() {
        let mock = Arc::new(MockExecutor::ok(" M dot_bashrc\n"));
        let status = client(&mock).git_status().unwrap();
        assert_eq!(status.unstaged.len(), 1);
        assert_eq!(call(&mock, 0), vec!["git", "--", "status", "--porcelain", "-u"]);
    }

    #[test]
    fn branch_info_combines_three_calls() {
        let mock = Arc::new(MockExecutor::with_responses(vec![
            (true, "main\n".to_string()),
            (true, "origin\nbackup\n".to_string()),
            (true, "2\t1\n".to_string()),
        ]));
        let info = client(&mock).git_branch_info().unwrap();
        assert_eq!(
            info,
            GitInfo {
                branch: "main".to_string(),
                remote: "origin".to_string(),
                ahead: 1,
                behind: 2,
            }
        );
    }

    #[test]
    fn branch_info_degrades_without_upstream() {
        let mock = Arc::new(MockExecutor::with_responses(vec![
            (true, "main\n".to_string()),
            (true, String::new()),
            (false, "fatal: no upstream configured for branch 'main'".to_string()),
        ]));
        let info = client(&mock).git_branch_info().unwrap();
        assert_eq!(info.branch, "main");
        assert_eq!(info.remote, "");
        assert_eq!((info.ahead, info.behind), (0, 0));
    }

    #[test]
    fn branch_info_fails_when_branch_fails() {
        let mock = Arc::new(MockExecutor::fail("fatal: not a git repository"));
        assert!(client(&mock).git_branch_info().is_err());
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn commit_with_nothing_staged_is_ok() {
        let mock = Arc::new(MockExecutor::fail(
            "On branch main\nnothing to commit, working tree clean\n",
        ));
        client(&mock).git_commit("msg").unwrap();
        assert_eq!(call(&mock, 0), vec!["git", "--", "commit", "-m", "msg"]);
    }

    #[test]
    fn commit_failure_is_error() {
        let mock = Arc::new(MockExecutor::fail("error: gpg failed to sign the data"));
        assert!(client(&mock).git_commit("msg").is_err());
    }

    #[test]
    fn unpushed_without_upstream_is_empty() {
        let mock = Arc::new(MockExecutor::fail(
            "fatal: ambiguous argument '@{upstream}..HEAD': unknown revision or path not in the working tree.",
        ));
        assert!(client(&mock).git_log_unpushed().unwrap().is_empty());
        assert_eq!(
            call(&mock, 0),
            vec!["git", "--", "log", "--oneline", "@{upstream}..HEAD"]
        );
    }

    #[test]
    fn incoming_lists_commits() {
        let mock = Arc::new(MockExecutor::ok("abc1234 Upstream change\n"));
        let commits = client(&mock).git_log_incoming().unwrap();
        assert_eq!(commits[0].message, "Upstream change");
        assert_eq!(
            call(&mock, 0),
            vec!["git", "--", "log", "--oneline", "HEAD..@{upstream}"]
        );
    }

    #[test]
    fn unpushed_other_failure_is_error() {
        let mock = Arc::new(MockExecutor::fail("fatal: not a git repository"));
        assert!(client(&mock).git_log_unpushed().is_err());
    }

    #[test]
    fn log_is_limited() {
        let mock = Arc::new(MockExecutor::ok("a1b2c3d First\n"));
        let commits = client(&mock).git_log().unwrap();
        assert_eq!(commits.len(), 1);
        assert_eq!(call(&mock, 0), vec!["git", "--", "log", "--oneline", "-20"]);
    }

    #[test]
    fn show_rejects_option_shaped_hash_without_spawning() {
        let mock = Arc::new(MockExecutor::ok(""));
        let err = client(&mock).git_show("--output=/tmp/pwn").unwrap_err();
        assert!(matches!(err, Error::Request(RequestError::InvalidHash(_))), "got {err:?}");
        assert_eq!(mock.call_count(), 0);
    }

    #[test]
    fn show_valid_hash() {
        let mock = Arc::new(MockExecutor::ok("commit abc1234\n"));
        let out = client(&mock).git_show("abc1234").unwrap();
        assert!(out.contains("abc1234"));
        assert_eq!(
            call(&mock, 0),
            vec!["git", "--", "show", "--format=fuller", "abc1234"]
        );
    }

    #[test]
    fn diff_cached_flag() {
        let mock = Arc::new(MockExecutor::ok(""));
        client(&mock).git_diff(Path::new("dot_bashrc"), true).unwrap();
        assert_eq!(
            call(&mock, 0),
            vec!["git", "--", "diff", "--cached", "--", "dot_bashrc"]
        );
    }

    #[test]
    fn mutating_git_argument_shapes() {
        let mock = Arc::new(MockExecutor::with_responses(vec![(true, String::new()); 6]));
        let c = client(&mock);
        c.git_add(Path::new("dot_a")).unwrap();
        c.git_add_all().unwrap();
        c.git_reset(Path::new("dot_a")).unwrap();
        c.git_reset_all().unwrap();
        c.git_soft_reset().unwrap();
        c.git_checkout_file(Path::new("dot_a")).unwrap();
        assert_eq!(call(&mock, 0), vec!["git", "--", "add", "--", "dot_a"]);
        assert_eq!(call(&mock, 1), vec!["git", "--", "add", "-A"]);
        assert_eq!(call(&mock, 2), vec!["git", "--", "reset", "HEAD", "--", "dot_a"]);
        assert_eq!(call(&mock, 3), vec!["git", "--", "reset", "HEAD"]);
        assert_eq!(call(&mock, 4), vec!["git", "--", "reset", "--soft", "HEAD~1"]);
        assert_eq!(call(&mock, 5), vec!["git", "--", "checkout", "--", "dot_a"]);
    }

    #[test]
    fn last_commit_is_best_effort() {
        let mock = Arc::new(MockExecutor::with_responses(vec![
            (true, "abc1234 Latest\n".to_string()),
            (false, "fatal: your current branch does not have any commits".to_string()),
        ]));
        let c = client(&mock);
        assert_eq!(c.git_last_commit().unwrap().message, "Latest");
        assert!(c.git_last_commit().is_none());
    }

    #[test]
    fn no_upstream_classifier() {
        let err: Error = ExecError::Failed {
            subcommand: "git log".to_string(),
            code: Some(128),
            output: "fatal: no upstream configured for branch 'main'".to_string(),
        }
        .into();
        assert!(is_no_upstream(&err));
        let other: Error = RequestError::InvalidHash("x".to_string()).into();
        assert!(!is_no_upstream(&other));
    }

    #[test]
    fn git_show_accepts_output_from_non_zero_exit() {
        let mock = Arc::new(MockExecutor::fail(
            "commit abc1234\nAuthor:     A <a@example.com>\n\n    tweak\n",
        ));
        let out = client(&mock).git_show("abc1234").unwrap();
        assert!(out.starts_with("commit abc1234"));
        assert_eq!(call(&mock, 0), vec!["git", "--", "show", "--format=fuller", "abc1234"]);
    }

    #[test]
    fn git_diff_accepts_output_from_non_zero_exit() {
        let mock = Arc::new(MockExecutor::fail("diff --git a/dot_bashrc b/dot_bashrc\n+x\n"));
        let out = client(&mock)
            .git_diff(Path::new("dot_bashrc"), true)
            .unwrap();
        assert!(out.contains("+x"));
        assert_eq!(
            call(&mock, 0),
            vec!["git", "--", "diff", "--cached", "--", "dot_bashrc"]
        );
    }

    #[test]
    fn git_show_fatal_output_is_error() {
        let mock = Arc::new(MockExecutor::fail("fatal: bad object abc1234\n"));
        let err = client(&mock).git_show("abc1234").unwrap_err();
        assert!(
            matches!(&err, Error::Exec(ExecError::Failed { output, .. }) if output == "fatal: bad object abc1234"),
            "got {err:?}"
        );
    }

    #[test]
    fn git_diff_fatal_output_is_error() {
        let mock = Arc::new(MockExecutor::fail("fatal: not a git repository\n"));
        assert!(client(&mock).git_diff(Path::new("x"), false).is_err());
    }
}
