//! Archive destination naming.
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use crate::config::APP_NAME;

/// File name prefix for generated archives.
const PREFIX: &str = "chezmoi-archive";

/// Directory archives are written to.
///
/// `~/.local/share/chezdeck/archives`, or the same layout under the system
/// temporary directory when no home directory is known.
#[must_use]
pub fn archive_dir() -> PathBuf {
    dirs::home_dir().map_or_else(
        || std::env::temp_dir().join(APP_NAME).join("archives"),
        |home| {
            home.join(".local")
                .join("share")
                .join(APP_NAME)
                .join("archives")
        },
    )
}

/// `YYYYMMDD-HHMMSS` for `now`.
#[must_use]
pub fn timestamp(now: NaiveDateTime) -> String {
    now.format("%Y%m%d-%H%M%S").to_string()
}

/// First unused archive path in `dir` for `now`.
///
/// Appends `-1`, `-2`, ... before the extension when an archive with the same
/// timestamp already exists.
#[must_use]
pub fn archive_path_in(dir: &Path, now: NaiveDateTime) -> PathBuf {
    let stamp = timestamp(now);
    let first = dir.join(format!("{PREFIX}-{stamp}.tar.gz"));
    if !first.exists() {
        return first;
    }
    (1_u32..)
        .map(|n| dir.join(format!("{PREFIX}-{stamp}-{n}.tar.gz")))
        .find(|p| !p.exists())
        .unwrap_or(first)
}
