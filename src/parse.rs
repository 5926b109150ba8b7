//! Pure text-to-record transforms for chezmoi and git output.
//!
//! Nothing here performs I/O. Each parser accepts the raw output blob and
//! returns records in input order, silently skipping malformed lines.
use crate::types::{FileStatus, GitCommit, GitFile, GitStatus};

/// Shortest hash accepted by [`is_valid_hash`].
pub const MIN_HASH_LEN: usize = 4;
/// Longest hash accepted by [`is_valid_hash`] (SHA-256 object names).
pub const MAX_HASH_LEN: usize = 64;

/// Split into lines, dropping a trailing `\r` from each.
fn lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().map(|l| l.strip_suffix('\r').unwrap_or(l))
}

/// Split a two-column status line into its codes and the path at offset 3.
///
/// Returns `None` for lines shorter than 4 characters.
fn split_columns(line: &str) -> Option<(char, char, &str)> {
    let mut chars = line.char_indices();
    let (_, x) = chars.next()?;
    let (_, y) = chars.next()?;
    chars.next()?;
    let (path_start, _) = chars.next()?;
    line.get(path_start..).map(|path| (x, y, path))
}

/// Parse `chezmoi status` output.
#[must_use]
pub fn parse_status(output: &str) -> Vec<FileStatus> {
    lines(output)
        .filter_map(split_columns)
        .map(|(source_status, dest_status, path)| FileStatus {
            path: path.to_string(),
            source_status,
            dest_status,
        })
        .collect()
}

/// Resolve the effective path of a porcelain entry.
///
/// Renames (`old -> new`) yield the new side, and each side may be wrapped
/// in double quotes when it contains special characters.
fn porcelain_path(raw: &str) -> &str {
    let path = quoted_prefix_len(raw)
        .and_then(|end| raw.get(end..))
        .and_then(|rest| rest.strip_prefix(" -> "))
        .or_else(|| raw.rsplit_once(" -> ").map(|(_, new)| new))
        .unwrap_or(raw);
    path.strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
        .unwrap_or(path)
}

/// Byte length of a leading double-quoted token, closing quote included.
fn quoted_prefix_len(raw: &str) -> Option<usize> {
    let body = raw.strip_prefix('"')?;
    let mut escaped = false;
    for (i, c) in body.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return Some(i + 2),
            _ => escaped = false,
        }
    }
    None
}

/// Parse `git status --porcelain` output into staged and unstaged files.
#[must_use]
pub fn parse_porcelain(output: &str) -> GitStatus {
    let mut status = GitStatus::default();
    for (x, y, raw) in lines(output).filter_map(split_columns) {
        let path = porcelain_path(raw);
        if x != ' ' && x != '?' {
            status.staged.push(GitFile {
                path: path.to_string(),
                status_code: x,
            });
        }
        if y != ' ' {
            let status_code = if x == '?' && y == '?' { 'U' } else { y };
            status.unstaged.push(GitFile {
                path: path.to_string(),
                status_code,
            });
        }
    }
    status
}

/// Parse `git log --oneline` output.
#[must_use]
pub fn parse_log(output: &str) -> Vec<GitCommit> {
    output
        .replace("\r\n", "\n")
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(|line| {
            let (hash, message) = line.split_once(' ').unwrap_or((line, ""));
            GitCommit {
                hash: hash.to_string(),
                message: message.to_string(),
            }
        })
        .collect()
}

/// Parse a plain path listing (`managed`, `ignored`, `unmanaged`).
#[must_use]
pub fn parse_lines(output: &str) -> Vec<String> {
    output
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}

/// Parse `rev-list --left-right --count @{upstream}...HEAD` output.
///
/// The left count is commits only upstream (behind), the right count is
/// commits only on `HEAD` (ahead). Returns `(ahead, behind)`.
#[must_use]
pub fn parse_ahead_behind(output: &str) -> Option<(u32, u32)> {
    let mut fields = output.split_whitespace();
    let behind = fields.next()?.parse().ok()?;
    let ahead = fields.next()?.parse().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some((ahead, behind))
}

/// Return `true` if `hash` is 4–64 hexadecimal digits.
///
/// Guards commands such as `git show` against arguments that would be
/// interpreted as options (anything starting with `-` fails here).
#[must_use]
pub fn is_valid_hash(hash: &str) -> bool {
    (MIN_HASH_LEN..=MAX_HASH_LEN).contains(&hash.len())
        && hash.bytes().all(|b| b.is_ascii_hexdigit())
}
