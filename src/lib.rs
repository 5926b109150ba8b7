//! Policy-gated orchestration layer over the chezmoi dotfile manager.
//!
//! chezmoi is driven as a subprocess; nothing here reimplements its logic.
//! The public API is organised into four layers:
//!
//! - **[`client`]**: typed wrapper that builds invocations and parses output
//! - **[`parse`]**: pure parsers for chezmoi and git text formats
//! - **[`policy`]**: read-only gate, target-path containment, command catalogue
//! - **[`service`]**: facade that consults the policy before every mutation
//!
//! [`cli`] and [`commands`] form the `chezdeck` binary on top of them.
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod logging;
pub mod parse;
pub mod policy;
pub mod service;
pub mod types;
