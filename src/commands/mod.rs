//! Subcommand handlers.
//!
//! Each handler talks to the [`Service`] and prints its result to stdout,
//! as text or, with `--json`, as pretty-printed JSON.
pub mod git;
pub mod interactive;
pub mod mutate;
pub mod query;
pub mod version;

use anyhow::Result;
use serde::Serialize;

use crate::cli::{Command, GlobalOpts};
use crate::config::{Config, Mode};
use crate::service::Service;

/// Load the config file and apply command-line overrides.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config(global: &GlobalOpts) -> Result<Config> {
    let mut config = Config::load(global.config.as_deref())?;
    if global.read_only {
        config.mode = Mode::ReadOnly;
    }
    if let Some(binary) = &global.binary {
        config.binary = Some(binary.clone());
    }
    if let Some(timeout) = global.timeout {
        config.timeout_secs = timeout;
    }
    if let Some(target) = &global.target {
        config.target = Some(dunce::simplified(target).to_path_buf());
    }
    if let Some(editor) = &global.editor {
        config.editor = Some(editor.clone());
    }
    Ok(config)
}

/// Where and how results are printed.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    /// Create an output sink; `json` selects JSON rendering.
    #[must_use]
    pub const fn new(json: bool) -> Self {
        Self { json }
    }

    /// Print `value` as JSON, or `text` rendered from it.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be serialized.
    pub fn emit<T, F>(&self, value: &T, text: F) -> Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            print_text(&text(value));
        }
        Ok(())
    }

    /// Print raw tool output; wrapped in `{"output": ...}` for JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn raw(&self, output: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Raw<'a> {
            output: &'a str,
        }
        self.emit(&Raw { output }, |r| r.output.to_string())
    }

    /// Print a one-line confirmation; `{"ok": true, "message": ...}` for JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn done(&self, message: &str) -> Result<()> {
        #[derive(Serialize)]
        struct Done<'a> {
            ok: bool,
            message: &'a str,
        }
        self.emit(&Done { ok: true, message }, |d| d.message.to_string())
    }
}

fn print_text(text: &str) {
    if text.is_empty() {
        return;
    }
    if text.ends_with('\n') {
        print!("{text}");
    } else {
        println!("{text}");
    }
}

/// Run a service-backed subcommand.
///
/// # Errors
///
/// Returns an error if the underlying operation fails or is refused.
pub fn run(command: &Command, service: &Service, out: Output) -> Result<()> {
    match command {
        Command::Status => query::status(service, out),
        Command::Diff(opts) => query::diff(service, opts.path.as_deref(), out),
        Command::Managed(opts) => query::managed(service, opts, out),
        Command::Ignored => query::ignored(service, out),
        Command::Unmanaged(opts) => query::unmanaged(service, &opts.paths, out),
        Command::Info(opts) => query::info(service, opts, out),
        Command::Verify => query::verify(service, out),
        Command::Commands => query::commands(service, out),
        Command::Archive => query::archive(service, out),
        Command::Add(opts) => mutate::add(service, opts, out),
        Command::ReAdd(opts) => mutate::re_add(service, opts.path.as_deref(), out),
        Command::Forget(opts) => mutate::forget(service, &opts.path, out),
        Command::Git(opts) => git::run(service, &opts.command, out),
        Command::Apply(opts) => interactive::apply(service, opts),
        Command::Update => interactive::update(service),
        Command::Init(opts) => interactive::init(service, opts.repo.as_deref()),
        Command::Edit(opts) => interactive::edit(service, opts.path.as_deref()),
        Command::EditConfig => interactive::edit_config(service),
        Command::EditConfigTemplate => interactive::edit_config_template(service),
        Command::Completions(_) | Command::Version => {
            anyhow::bail!("'{}' does not use chezmoi", command.name())
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mode = \"write\"\ntimeout_secs = 10\neditor = \"vi\"\n").unwrap();
        let global = GlobalOpts {
            config: Some(path),
            read_only: true,
            timeout: Some(3),
            target: Some(PathBuf::from("/home/u")),
            ..GlobalOpts::default()
        };
        let config = load_config(&global).unwrap();
        assert_eq!(config.mode, Mode::ReadOnly);
        assert_eq!(config.timeout(), Duration::from_secs(3));
        assert_eq!(config.target, Some(PathBuf::from("/home/u")));
        assert_eq!(config.editor.as_deref(), Some("vi"));
    }

    #[test]
    fn file_values_survive_without_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mode = \"read-only\"\n").unwrap();
        let global = GlobalOpts {
            config: Some(path),
            ..GlobalOpts::default()
        };
        let config = load_config(&global).unwrap();
        assert_eq!(config.mode, Mode::ReadOnly);
        assert_eq!(config.binary, None);
    }
}
