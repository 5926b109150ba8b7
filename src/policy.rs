//! Mutation gate, path containment, and the derived command catalogue.
//!
//! [`Policy`] is a pure function of its two inputs: the [`Mode`] and the
//! managed target root. It never touches the filesystem or spawns processes,
//! so every decision it makes happens before the external tool is invoked.
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::config::Mode;
use crate::error::PolicyError;

/// Menu section a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Commands that write the destination state.
    Apply,
    /// Read-only inspection.
    Info,
    /// Editor sessions.
    Edit,
}

/// One row of the command menu offered to the front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandAvailability {
    /// Menu label.
    pub label: &'static str,
    /// One-line help text.
    pub description: &'static str,
    /// Equivalent `chezdeck` invocation.
    pub command: &'static str,
    /// Menu section.
    pub category: Category,
    /// `false` when listed but not runnable (no editor).
    pub available: bool,
    /// `true` when a `--dry-run` preview exists.
    pub supports_dry_run: bool,
}

impl CommandAvailability {
    const fn new(
        label: &'static str,
        description: &'static str,
        command: &'static str,
        category: Category,
    ) -> Self {
        Self {
            label,
            description,
            command,
            category,
            available: true,
            supports_dry_run: false,
        }
    }

    const fn with_dry_run(mut self) -> Self {
        self.supports_dry_run = true;
        self
    }

    const fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }
}

/// Mutation and path policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    mode: Mode,
    target: Option<PathBuf>,
}

impl Policy {
    /// Create a policy for `mode`, guarding the tree rooted at `target`.
    #[must_use]
    pub const fn new(mode: Mode, target: Option<PathBuf>) -> Self {
        Self { mode, target }
    }

    /// The configured mode.
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    /// The managed target root, if configured.
    #[must_use]
    pub fn target(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    /// Return `true` if mutations are disabled.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.mode == Mode::ReadOnly
    }

    /// Gate a mutating operation.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::ReadOnly`] in read-only mode.
    pub fn check_mutation(&self) -> Result<(), PolicyError> {
        if self.is_read_only() {
            return Err(PolicyError::ReadOnly);
        }
        Ok(())
    }

    /// Ensure `path` is the target root or lies beneath it.
    ///
    /// Containment is checked component by component on lexically cleaned
    /// paths, so a target of `/home/user` does not admit `/home/username`.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::PathEmpty`] for an empty path,
    /// [`PolicyError::PathNotAbs`] for a relative one, and
    /// [`PolicyError::OutsideTarget`] when no target root is configured or
    /// the path escapes it.
    pub fn validate_target_path(&self, path: &Path) -> Result<(), PolicyError> {
        if path.as_os_str().is_empty() {
            return Err(PolicyError::PathEmpty);
        }
        if !path.is_absolute() {
            return Err(PolicyError::PathNotAbs {
                path: path.to_path_buf(),
            });
        }
        let outside = || PolicyError::OutsideTarget {
            path: path.to_path_buf(),
        };
        let target = self.target.as_deref().ok_or_else(outside)?;
        if clean(path).starts_with(clean(target)) {
            Ok(())
        } else {
            Err(outside())
        }
    }

    /// Build the ordered command catalogue for the current mode.
    ///
    /// `has_edit_source` and `has_edit_config` report whether an editor
    /// session can be started for the source directory and the config file.
    #[must_use]
    pub fn available_commands(
        &self,
        has_edit_source: bool,
        has_edit_config: bool,
    ) -> Vec<CommandAvailability> {
        use Category::{Apply, Edit, Info};

        let writable = !self.is_read_only();
        let mut commands = Vec::with_capacity(16);

        if writable {
            commands.extend([
                CommandAvailability::new(
                    "Apply",
                    "Apply all pending changes to the destination",
                    "chezmoi apply",
                    Apply,
                )
                .with_dry_run(),
                CommandAvailability::new(
                    "Update",
                    "Pull from the source repository and apply",
                    "chezmoi update",
                    Apply,
                ),
                CommandAvailability::new(
                    "Refresh Externals",
                    "Re-download externals and apply",
                    "chezmoi apply --refresh-externals",
                    Apply,
                )
                .with_dry_run(),
                CommandAvailability::new(
                    "Re-Add All",
                    "Copy every modified destination file back to the source",
                    "chezmoi re-add",
                    Apply,
                ),
                CommandAvailability::new(
                    "Init",
                    "Regenerate the config file from its template",
                    "chezmoi init",
                    Apply,
                ),
            ]);
        }

        commands.extend([
            CommandAvailability::new("Status", "Show what apply would change", "chezmoi status", Info),
            CommandAvailability::new("Diff All", "Show the full pending diff", "chezmoi diff", Info),
            CommandAvailability::new("Doctor", "Check for common problems", "chezmoi doctor", Info),
            CommandAvailability::new(
                "Verify",
                "Check the destination matches the target state",
                "chezmoi verify",
                Info,
            ),
            CommandAvailability::new("Data", "Show template data", "chezmoi data", Info),
            CommandAvailability::new(
                "Cat Config",
                "Show the configuration file",
                "chezmoi cat-config",
                Info,
            ),
            CommandAvailability::new(
                "Git Log",
                "Show recent source repository commits",
                "chezmoi git -- log --oneline",
                Info,
            ),
            CommandAvailability::new(
                "Archive",
                "Write a tarball of the target state",
                "chezmoi archive",
                Info,
            ),
        ]);

        if writable && has_edit_source {
            commands.push(CommandAvailability::new(
                "Edit Source",
                "Open the source directory in the editor",
                "chezmoi edit",
                Edit,
            ));
        }
        if has_edit_config {
            commands.push(CommandAvailability::new(
                "Edit Config",
                "Edit the chezmoi configuration file",
                "chezmoi edit-config",
                Edit,
            ));
        }
        commands.push(
            CommandAvailability::new(
                "Edit Config Template",
                "Edit the configuration file template",
                "chezmoi edit-config-template",
                Edit,
            )
            .with_available(has_edit_config),
        );

        commands
    }
}

/// Lexically normalize a path: drop `.` and resolve `..` against earlier
/// components. The filesystem is not consulted.
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}
