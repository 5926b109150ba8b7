// Shared helpers for integration tests.
//
// Provides a fake `chezmoi` executable backed by a temporary directory and a
// fluent builder, so each integration test can script the tool's responses
// and inspect the exact arguments it was invoked with.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::fmt::Write as _;
use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chezdeck::client::{BASELINE_FLAGS, Client, ClientOptions};
use chezdeck::config::Mode;
use chezdeck::policy::Policy;
use chezdeck::service::Service;

/// One scripted response, selected by argument prefix.
struct Response {
    prefix: String,
    stdout: String,
    stderr: String,
    exit: i32,
    sleep_secs: Option<u32>,
    background_secs: Option<u32>,
}

/// Quote `s` for a POSIX shell single-quoted string.
fn sh_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// A fake chezmoi executable in a temporary directory.
///
/// Every invocation appends its full argument list to `calls.log` and its
/// git-related environment to `env.log`. The directory is deleted when
/// dropped.
pub struct FakeChezmoi {
    dir: tempfile::TempDir,
}

impl FakeChezmoi {
    /// Path to the executable.
    pub fn binary(&self) -> PathBuf {
        self.dir.path().join("chezmoi")
    }

    /// The temporary directory, for tests that need scratch space.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Every recorded argument list, one string per invocation.
    pub fn calls(&self) -> Vec<String> {
        read_lines(&self.dir.path().join("calls.log"))
    }

    /// Recorded calls with the baseline flags stripped.
    pub fn subcommands(&self) -> Vec<String> {
        let prefix = format!("{} ", BASELINE_FLAGS.join(" "));
        self.calls()
            .into_iter()
            .map(|c| c.strip_prefix(&prefix).map(str::to_string).unwrap_or(c))
            .collect()
    }

    /// Recorded `GIT_PAGER` / `GIT_TERMINAL_PROMPT` pairs.
    pub fn env(&self) -> Vec<String> {
        read_lines(&self.dir.path().join("env.log"))
    }

    /// A client running this fake with `timeout`.
    pub fn client(&self, timeout: Duration) -> Client {
        Client::new(ClientOptions {
            binary: Some(self.binary()),
            timeout: Some(timeout),
            editor: None,
        })
    }

    /// A service over this fake with `mode`, guarding `/home/u`.
    pub fn service(&self, mode: Mode) -> Service {
        Service::new(
            self.client(Duration::from_secs(10)),
            Policy::new(mode, Some(PathBuf::from("/home/u"))),
        )
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// Fluent builder for [`FakeChezmoi`].
///
/// Responses are matched against the arguments after the baseline flags, by
/// prefix, in the order they were added. Unmatched calls succeed silently.
#[derive(Default)]
pub struct FakeChezmoiBuilder {
    responses: Vec<Response>,
}

impl FakeChezmoiBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed with `stdout` for calls starting with `prefix`.
    pub fn on(self, prefix: &str, stdout: &str) -> Self {
        self.respond(prefix, stdout, "", 0, None)
    }

    /// Exit with `code`, printing `stdout` and `stderr`.
    pub fn exits(self, prefix: &str, code: i32, stdout: &str, stderr: &str) -> Self {
        self.respond(prefix, stdout, stderr, code, None)
    }

    /// Leave a background `sleep secs` holding the output pipes, then
    /// succeed with `stdout`.
    pub fn detaches(mut self, prefix: &str, secs: u32, stdout: &str) -> Self {
        self = self.on(prefix, stdout);
        if let Some(last) = self.responses.last_mut() {
            last.background_secs = Some(secs);
        }
        self
    }

    /// Sleep for `secs` before succeeding with no output.
    pub fn sleeps(self, prefix: &str, secs: u32) -> Self {
        self.respond(prefix, "", "", 0, Some(secs))
    }

    fn respond(
        mut self,
        prefix: &str,
        stdout: &str,
        stderr: &str,
        exit: i32,
        sleep_secs: Option<u32>,
    ) -> Self {
        self.responses.push(Response {
            prefix: prefix.to_string(),
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit,
            sleep_secs,
            background_secs: None,
        });
        self
    }

    /// Write the script and return the fake.
    pub fn build(self) -> FakeChezmoi {
        let dir = tempfile::tempdir().expect("create temp dir");
        let calls = dir.path().join("calls.log");
        let env = dir.path().join("env.log");

        let mut script = String::from("#!/bin/sh\n");
        writeln!(
            script,
            "printf '%s\\n' \"$*\" >> {}",
            sh_quote(&calls.to_string_lossy())
        )
        .expect("format");
        writeln!(
            script,
            "printf 'GIT_PAGER=%s GIT_TERMINAL_PROMPT=%s\\n' \"$GIT_PAGER\" \"$GIT_TERMINAL_PROMPT\" >> {}",
            sh_quote(&env.to_string_lossy())
        )
        .expect("format");
        writeln!(
            script,
            "while [ $# -gt 0 ]; do case \"$1\" in {}) shift ;; *) break ;; esac; done",
            BASELINE_FLAGS.join("|")
        )
        .expect("format");
        script.push_str("case \"$*\" in\n");
        for r in &self.responses {
            writeln!(script, "  {}*)", sh_quote(&r.prefix)).expect("format");
            if let Some(secs) = r.sleep_secs {
                writeln!(script, "    exec sleep {secs}").expect("format");
            }
            if let Some(secs) = r.background_secs {
                writeln!(script, "    sleep {secs} &").expect("format");
            }
            writeln!(script, "    printf '%s' {}", sh_quote(&r.stdout)).expect("format");
            writeln!(script, "    printf '%s' {} >&2", sh_quote(&r.stderr)).expect("format");
            writeln!(script, "    exit {}", r.exit).expect("format");
            script.push_str("    ;;\n");
        }
        script.push_str("esac\nexit 0\n");

        let binary = dir.path().join("chezmoi");
        std::fs::write(&binary, script).expect("write fake chezmoi");
        std::fs::set_permissions(&binary, std::fs::Permissions::from_mode(0o755))
            .expect("chmod fake chezmoi");
        FakeChezmoi { dir }
    }
}
