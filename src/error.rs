//! Domain-specific error types for the chezmoi orchestration layer.
//!
//! Every layer returns a typed error built with [`thiserror`]. The host
//! binary converts them to [`anyhow::Error`] at the command boundary via the
//! standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! Error
//! ├── Policy(PolicyError)  : read-only mode, path containment
//! ├── Request(RequestError): malformed arguments rejected before spawning
//! ├── Exec(ExecError)      : spawn failures, timeouts, non-zero exits
//! ├── Io                   : local filesystem work (archive directory)
//! └── Config               : configuration file loading
//! ```
//!
//! Policy and request errors are always produced before any process is
//! spawned, so they never leave partial side effects behind.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for the orchestration layer.
#[derive(Error, Debug)]
pub enum Error {
    /// A mutation or path was rejected by the policy.
    #[error(transparent)]
    Policy(#[from] PolicyError),

    /// A request was malformed and rejected before invocation.
    #[error(transparent)]
    Request(#[from] RequestError),

    /// The external process could not be run or reported failure.
    #[error(transparent)]
    Exec(#[from] ExecError),

    /// A local filesystem operation failed.
    #[error("IO error at {}: {source}", path.display())]
    Io {
        /// Path involved in the failed operation.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file could not be read or parsed.
    #[error("invalid config {}: {message}", path.display())]
    Config {
        /// Path to the configuration file.
        path: PathBuf,
        /// Human-readable parse or read failure.
        message: String,
    },
}

/// Errors raised by the mutation and path policy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// A mutating operation was attempted while in read-only mode.
    #[error("operation not permitted: read-only mode is enabled")]
    ReadOnly,

    /// The path lies outside the managed target root, or no root is configured.
    #[error("path is outside the managed target directory: {}", path.display())]
    OutsideTarget {
        /// The rejected path.
        path: PathBuf,
    },

    /// An empty path was supplied.
    #[error("path is empty")]
    PathEmpty,

    /// A relative path was supplied where an absolute one is required.
    #[error("path is not absolute: {}", path.display())]
    PathNotAbs {
        /// The rejected path.
        path: PathBuf,
    },
}

/// Errors for requests rejected before the external tool is invoked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A git object reference did not look like an abbreviated or full hash.
    #[error("invalid hash '{0}': expected 4-64 hexadecimal characters")]
    InvalidHash(String),

    /// More than one of encrypt, template and autotemplate was requested.
    #[error("conflicting add options: encrypt, template and autotemplate are mutually exclusive")]
    ConflictingAddOptions,

    /// `re-add` was requested for a file chezmoi does not manage.
    #[error("{} is not managed by chezmoi; use add instead of re-add", .0.display())]
    NotManaged(PathBuf),
}

/// Errors from running the external process.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The process could not be started.
    #[error("failed to execute chezmoi {subcommand}: {source}")]
    Spawn {
        /// Subcommand label (e.g. `status`, `git log`).
        subcommand: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Waiting on or collecting output from the process failed.
    #[error("failed to wait for chezmoi {subcommand}: {source}")]
    Wait {
        /// Subcommand label.
        subcommand: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The process exceeded its deadline and was killed.
    #[error("chezmoi {subcommand} timed out after {timeout:?}")]
    Timeout {
        /// Subcommand label.
        subcommand: String,
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// The process exited unsuccessfully.
    #[error("chezmoi {subcommand} failed (exit {}): {output}", code.unwrap_or(-1))]
    Failed {
        /// Subcommand label.
        subcommand: String,
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Trimmed combined stdout and stderr.
        output: String,
    },
}

impl Error {
    /// Return `true` if this error is the read-only policy rejection.
    #[must_use]
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::Policy(PolicyError::ReadOnly))
    }

    /// Return `true` if the external process timed out.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Exec(ExecError::Timeout { .. }))
    }
}
