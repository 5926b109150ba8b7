//! Version and shell completions.
use clap::CommandFactory as _;

use crate::cli::Cli;
use crate::client::Client;

/// Version string of this build.
#[must_use]
pub fn version_string() -> &'static str {
    option_env!("CHEZDECK_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the chezdeck version and, when chezmoi can be run, its version.
pub fn run(client: &Client) {
    println!("chezdeck {}", version_string());
    match client.version() {
        Ok(version) => println!("{version}"),
        Err(e) => tracing::debug!(error = %e, "chezmoi version unavailable"),
    }
}

/// Print completions for `shell` to stdout.
pub fn completions(shell: clap_complete::Shell) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version_string().is_empty());
    }

    #[test]
    fn completions_generate_for_bash() {
        let mut command = Cli::command();
        let mut buf = Vec::new();
        clap_complete::generate(clap_complete::Shell::Bash, &mut command, "chezdeck", &mut buf);
        let script = String::from_utf8(buf).unwrap();
        assert!(script.contains("chezdeck"));
        assert!(script.contains("edit-config-template"));
    }
}
