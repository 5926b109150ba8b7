//! Typed records produced by the parsers and consumed by the front end.
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Component, Path};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Directory under the source state that holds run scripts.
pub const SCRIPTS_DIR: &str = ".chezmoiscripts";

/// One line of `chezmoi status` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileStatus {
    /// Absolute destination path.
    pub path: String,
    /// First column: last state written by chezmoi vs. the actual state.
    pub source_status: char,
    /// Second column: actual state vs. the target state (what `apply` does).
    pub dest_status: char,
}

impl FileStatus {
    /// Return `true` if either status column is non-blank.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.source_status != ' ' || self.dest_status != ' '
    }

    /// Return `true` if the path lies under the reserved scripts directory.
    #[must_use]
    pub fn is_script(&self) -> bool {
        Path::new(&self.path)
            .components()
            .any(|c| matches!(c, Component::Normal(name) if name == SCRIPTS_DIR))
    }

    /// Classify which side changed.
    #[must_use]
    pub fn side_label(&self) -> &'static str {
        match (self.source_status != ' ', self.dest_status != ' ') {
            (true, true) => "diverged",
            (false, true) if self.dest_status == 'R' => "pending script run",
            (false, true) => "pending apply",
            (true, false) => "target changed",
            (false, false) => "",
        }
    }
}

/// One file from `git status --porcelain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitFile {
    /// Path relative to the source directory.
    pub path: String,
    /// Single-letter status; `'U'` marks an untracked file.
    pub status_code: char,
}

/// Porcelain status split into index and worktree sides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitStatus {
    /// Index changes.
    pub staged: Vec<GitFile>,
    /// Worktree changes and untracked files.
    pub unstaged: Vec<GitFile>,
}

/// Branch and upstream divergence summary.
///
/// Every field is zero or empty when the information is unavailable, e.g.
/// when no upstream is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GitInfo {
    /// Current branch name.
    pub branch: String,
    /// First configured remote.
    pub remote: String,
    /// Local commits not on the upstream.
    pub ahead: u32,
    /// Upstream commits not merged locally.
    pub behind: u32,
}

/// One `git log --oneline` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GitCommit {
    /// Abbreviated commit hash.
    pub hash: String,
    /// Subject line.
    pub message: String,
}

/// Entry types accepted by `--include` / `--exclude`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Directories.
    Dirs,
    /// Regular files.
    Files,
    /// Template sources.
    Templates,
    /// Encrypted sources.
    Encrypted,
    /// Entries from `.chezmoiexternal`.
    Externals,
    /// Scripts.
    Scripts,
    /// Symbolic links.
    Symlinks,
    /// `run_` scripts that execute on every apply.
    Always,
}

impl EntryType {
    /// Every entry type, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Dirs,
        Self::Files,
        Self::Templates,
        Self::Encrypted,
        Self::Externals,
        Self::Scripts,
        Self::Symlinks,
        Self::Always,
    ];

    /// The name chezmoi uses on its command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dirs => "dirs",
            Self::Files => "files",
            Self::Templates => "templates",
            Self::Encrypted => "encrypted",
            Self::Externals => "externals",
            Self::Scripts => "scripts",
            Self::Symlinks => "symlinks",
            Self::Always => "always",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown entry type '{s}'"))
    }
}

/// Include/exclude restriction for entry listings. Empty means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryFilter {
    /// Only these types, when non-empty.
    pub include: BTreeSet<EntryType>,
    /// Never these types.
    pub exclude: BTreeSet<EntryType>,
}

impl EntryFilter {
    /// Return `true` if neither set restricts anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Return `true` if `ty` appears in either set.
    #[must_use]
    pub fn mentions(&self, ty: EntryType) -> bool {
        self.include.contains(&ty) || self.exclude.contains(&ty)
    }

    /// The filter used for `managed`: directories are excluded unless the
    /// caller said something about them.
    #[must_use]
    pub fn for_managed(&self) -> Self {
        let mut filter = self.clone();
        if !filter.mentions(EntryType::Dirs) {
            filter.exclude.insert(EntryType::Dirs);
        }
        filter
    }

    /// Render as `--include=a,b` / `--exclude=c` arguments.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let join = |set: &BTreeSet<EntryType>| {
            set.iter()
                .map(|t| t.as_str())
                .collect::<Vec<_>>()
                .join(",")
        };
        let mut args = Vec::new();
        if !self.include.is_empty() {
            args.push(format!("--include={}", join(&self.include)));
        }
        if !self.exclude.is_empty() {
            args.push(format!("--exclude={}", join(&self.exclude)));
        }
        args
    }
}

/// Flags for `chezmoi add`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AddOptions {
    /// `--encrypt`.
    pub encrypt: bool,
    /// `--template`.
    pub template: bool,
    /// `--autotemplate`.
    pub auto_template: bool,
    /// `--exact`.
    pub exact: bool,
    /// `--recursive=false`.
    pub no_recursive: bool,
}

impl AddOptions {
    /// Reject combinations chezmoi cannot honour.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ConflictingAddOptions`] when more than one of
    /// `encrypt`, `template` and `auto_template` is set.
    pub fn validate(&self) -> Result<(), RequestError> {
        let exclusive = [self.encrypt, self.template, self.auto_template]
            .into_iter()
            .filter(|set| *set)
            .count();
        if exclusive > 1 {
            return Err(RequestError::ConflictingAddOptions);
        }
        Ok(())
    }

    /// Render as `chezmoi add` flags.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if self.encrypt {
            args.push("--encrypt".to_string());
        }
        if self.template {
            args.push("--template".to_string());
        }
        if self.auto_template {
            args.push("--autotemplate".to_string());
        }
        if self.exact {
            args.push("--exact".to_string());
        }
        if self.no_recursive {
            args.push("--recursive=false".to_string());
        }
        args
    }
}

/// Aggregated status view.
///
/// The git fields stay empty in read-only mode or when git status fails.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusSnapshot {
    /// `chezmoi status` records.
    pub files: Vec<FileStatus>,
    /// Staged source-repository changes.
    pub staged: Vec<GitFile>,
    /// Unstaged source-repository changes.
    pub unstaged: Vec<GitFile>,
    /// Branch and upstream summary.
    pub git_info: GitInfo,
}

/// Serialization format for structured dumps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoFormat {
    /// JSON.
    #[default]
    Json,
    /// YAML.
    Yaml,
}

impl InfoFormat {
    /// The value passed to `--format`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
        }
    }
}

/// Which informational view to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoView {
    /// The raw configuration file (`cat-config`).
    Config,
    /// The fully computed configuration (`dump-config`).
    Full,
    /// Template data (`data`).
    Data,
    /// Environment diagnostics (`doctor`).
    Doctor,
}

impl InfoView {
    /// Parse a view name, returning `None` for anything unrecognized.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "config" => Some(Self::Config),
            "full" => Some(Self::Full),
            "data" => Some(Self::Data),
            "doctor" => Some(Self::Doctor),
            _ => None,
        }
    }
}

/// Request for [`Service::load_info`](crate::service::Service::load_info).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InfoRequest {
    /// View to load.
    pub view: InfoView,
    /// Format for views that support one.
    pub format: InfoFormat,
}

/// Result of an info request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InfoContent {
    /// `None` when the requested view was not recognized.
    pub view: Option<InfoView>,
    /// Format the content was requested in.
    pub format: InfoFormat,
    /// Tool output, verbatim.
    pub content: String,
}
