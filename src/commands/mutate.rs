//! Subcommands that change the source state.
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use super::Output;
use crate::cli::AddOpts;
use crate::service::Service;
use crate::types::AddOptions;

impl From<&AddOpts> for AddOptions {
    fn from(opts: &AddOpts) -> Self {
        Self {
            encrypt: opts.encrypt,
            template: opts.template,
            auto_template: opts.autotemplate,
            exact: opts.exact,
            no_recursive: opts.no_recursive,
        }
    }
}

/// Make `path` absolute against the working directory.
fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    Ok(cwd.join(path))
}

/// `add <path> [flags]`.
///
/// # Errors
///
/// Returns an error in read-only mode, for paths outside the target root,
/// for conflicting flags, or if chezmoi fails.
pub fn add(service: &Service, opts: &AddOpts, out: Output) -> Result<()> {
    let path = absolute(&opts.path)?;
    service.add(&path, &AddOptions::from(opts))?;
    out.done(&format!("added {}", path.display()))
}

/// `re-add [path]`.
///
/// # Errors
///
/// Returns an error in read-only mode, for unmanaged files, or if chezmoi
/// fails.
pub fn re_add(service: &Service, path: Option<&Path>, out: Output) -> Result<()> {
    match path {
        Some(path) => {
            let path = absolute(path)?;
            service.re_add(&path)?;
            out.done(&format!("re-added {}", path.display()))
        }
        None => {
            service.re_add_all()?;
            out.done("re-added all modified files")
        }
    }
}

/// `forget <path>`.
///
/// # Errors
///
/// Returns an error in read-only mode or if chezmoi fails.
pub fn forget(service: &Service, path: &Path, out: Output) -> Result<()> {
    let path = absolute(path)?;
    service.forget(&path)?;
    out.done(&format!("forgot {}", path.display()))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn add_opts_map_to_add_options() {
        let opts = AddOpts {
            path: PathBuf::from("/home/u/.x"),
            encrypt: false,
            template: false,
            autotemplate: true,
            exact: true,
            no_recursive: true,
        };
        let options = AddOptions::from(&opts);
        assert!(options.auto_template);
        assert!(options.exact);
        assert!(options.no_recursive);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn relative_paths_are_anchored_to_cwd() {
        let path = absolute(Path::new(".bashrc")).unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with(".bashrc"));
        assert_eq!(absolute(Path::new("/etc/x")).unwrap(), PathBuf::from("/etc/x"));
    }
}
