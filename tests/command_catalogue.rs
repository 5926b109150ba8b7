#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the command catalogue offered to front ends.
//!
//! The catalogue order is part of the interface, so it is pinned with
//! snapshots for both modes.

use chezdeck::config::Mode;
use chezdeck::policy::{Category, CommandAvailability, Policy};

fn render(commands: &[CommandAvailability]) -> String {
    commands
        .iter()
        .map(|c| {
            let mut line = format!("{:?}: {}", c.category, c.label);
            if c.supports_dry_run {
                line.push_str(" [dry-run]");
            }
            if !c.available {
                line.push_str(" [unavailable]");
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Full catalogue for a writable session with an editor.
#[test]
fn catalogue_write_mode() {
    let policy = Policy::new(Mode::Write, None);
    insta::assert_snapshot!("catalogue_write_mode", render(&policy.available_commands(true, true)));
}

/// Read-only session without an editor.
#[test]
fn catalogue_read_only_mode() {
    let policy = Policy::new(Mode::ReadOnly, None);
    insta::assert_snapshot!(
        "catalogue_read_only_mode",
        render(&policy.available_commands(false, false))
    );
}

// ---------------------------------------------------------------------------
// Structural invariants
// ---------------------------------------------------------------------------

/// No apply-category command is ever offered in read-only mode.
#[test]
fn read_only_has_no_apply_category() {
    let policy = Policy::new(Mode::ReadOnly, None);
    for (source, config) in [(false, false), (true, false), (false, true), (true, true)] {
        let commands = policy.available_commands(source, config);
        assert!(commands.iter().all(|c| c.category != Category::Apply));
        assert!(commands.iter().all(|c| c.label != "Edit Source"));
    }
}

/// Edit Config follows the editor, not the mode.
#[test]
fn edit_config_ignores_mode() {
    for mode in [Mode::Write, Mode::ReadOnly] {
        let labels: Vec<_> = Policy::new(mode, None)
            .available_commands(false, true)
            .iter()
            .map(|c| c.label)
            .collect();
        assert!(labels.contains(&"Edit Config"), "{mode:?}: {labels:?}");
    }
}

/// Labels are unique within a catalogue.
#[test]
fn labels_are_unique() {
    let commands = Policy::new(Mode::Write, None).available_commands(true, true);
    let mut labels: Vec<_> = commands.iter().map(|c| c.label).collect();
    let total = labels.len();
    labels.sort_unstable();
    labels.dedup();
    assert_eq!(labels.len(), total);
}
