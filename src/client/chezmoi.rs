//! chezmoi subcommands.
use std::path::{Path, PathBuf};

use super::{Client, arg, looks_like_error};
use crate::error::{Error, ExecError, RequestError, Result};
use crate::parse;
use crate::types::{AddOptions, EntryFilter, FileStatus, InfoFormat};

impl Client {
    /// `chezmoi --version`, trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn version(&self) -> Result<String> {
        let result = self.run("version", ["--version"])?;
        Ok(result.stdout.trim().to_string())
    }

    /// `chezmoi status --path-style=absolute`.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn status(&self) -> Result<Vec<FileStatus>> {
        let result = self.run("status", ["status", "--path-style=absolute"])?;
        Ok(parse::parse_status(&result.stdout))
    }

    /// `chezmoi diff [path]`. A non-zero exit with diff-looking output is
    /// still a success.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or reports a real failure.
    pub fn diff(&self, path: Option<&Path>) -> Result<String> {
        let mut args = vec!["diff".to_string()];
        args.extend(path.map(arg));
        self.run_lenient("diff", args)
    }

    /// `chezmoi add --force [flags] -- path`.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ConflictingAddOptions`] before spawning
    /// anything if the options are inconsistent, or an error if chezmoi fails.
    pub fn add(&self, path: &Path, options: &AddOptions) -> Result<()> {
        options.validate()?;
        let mut args = vec!["add".to_string(), "--force".to_string()];
        args.extend(options.to_args());
        args.push("--".to_string());
        args.push(arg(path));
        self.run("add", args)?;
        Ok(())
    }

    /// `chezmoi dump-config --format=<format>`.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn dump_config(&self, format: InfoFormat) -> Result<String> {
        let format = format!("--format={}", format.as_str());
        Ok(self.run("dump-config", ["dump-config", format.as_str()])?.combined())
    }

    /// `chezmoi re-add --force path`, after confirming the file is managed.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::NotManaged`] without running `re-add` if
    /// `source-path` rejects the file. Spawn failures and timeouts of that
    /// lookup are returned as they are.
    pub fn re_add(&self, path: &Path) -> Result<()> {
        match self.source_path(Some(path)) {
            Ok(_) => {}
            Err(Error::Exec(ExecError::Failed { .. })) => {
                return Err(RequestError::NotManaged(path.to_path_buf()).into());
            }
            Err(e) => return Err(e),
        }
        self.run("re-add", ["re-add".to_string(), "--force".to_string(), arg(path)])?;
        Ok(())
    }

    /// `chezmoi re-add --force` for every modified managed file.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn re_add_all(&self) -> Result<()> {
        self.run("re-add", ["re-add", "--force"])?;
        Ok(())
    }

    /// `chezmoi managed --path-style=absolute`, with directories excluded
    /// unless `filter` mentions them.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn managed(&self, filter: &EntryFilter) -> Result<Vec<String>> {
        let mut args = vec!["managed".to_string(), "--path-style=absolute".to_string()];
        args.extend(filter.for_managed().to_args());
        let result = self.run("managed", args)?;
        Ok(parse::parse_lines(&result.stdout))
    }

    /// `chezmoi ignored`.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn ignored(&self) -> Result<Vec<String>> {
        let result = self.run("ignored", ["ignored"])?;
        Ok(parse::parse_lines(&result.stdout))
    }

    /// `chezmoi unmanaged --path-style=absolute [paths...]`.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn unmanaged(&self, paths: &[PathBuf]) -> Result<Vec<String>> {
        let mut args = vec!["unmanaged".to_string(), "--path-style=absolute".to_string()];
        args.extend(paths.iter().map(|p| arg(p)));
        let result = self.run("unmanaged", args)?;
        Ok(parse::parse_lines(&result.stdout))
    }

    /// `chezmoi source-path [path]`: the source directory, or the source
    /// file backing `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi exits non-zero, which is how it reports
    /// an unmanaged `path`.
    pub fn source_path(&self, path: Option<&Path>) -> Result<PathBuf> {
        let mut args = vec!["source-path".to_string()];
        args.extend(path.map(arg));
        let result = self.run("source-path", args)?;
        Ok(PathBuf::from(result.stdout.trim()))
    }

    /// `chezmoi target-path`: the destination directory.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn target_path(&self) -> Result<PathBuf> {
        let result = self.run("target-path", ["target-path"])?;
        Ok(PathBuf::from(result.stdout.trim()))
    }

    /// `chezmoi forget --force path`.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn forget(&self, path: &Path) -> Result<()> {
        self.run("forget", ["forget".to_string(), "--force".to_string(), arg(path)])?;
        Ok(())
    }

    /// `chezmoi cat path`: the target contents of a managed file.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn cat(&self, path: &Path) -> Result<String> {
        Ok(self.run("cat", ["cat".to_string(), arg(path)])?.combined())
    }

    /// `chezmoi cat-config`.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn cat_config(&self) -> Result<String> {
        Ok(self.run("cat-config", ["cat-config"])?.combined())
    }

    /// `chezmoi data --format=<format>`.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn data(&self, format: InfoFormat) -> Result<String> {
        let format = format!("--format={}", format.as_str());
        Ok(self.run("data", ["data", format.as_str()])?.combined())
    }

    /// `chezmoi doctor`. Doctor exits non-zero when a check fails, which
    /// still produces the report.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or reports a real failure.
    pub fn doctor(&self) -> Result<String> {
        self.run_lenient("doctor", ["doctor"])
    }

    /// `chezmoi verify`: `true` when the destination matches the target
    /// state, `false` when it does not.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or prints an error message.
    pub fn verify(&self) -> Result<bool> {
        let result = self.run_unchecked("verify", ["verify"])?;
        if result.success {
            return Ok(true);
        }
        if looks_like_error(&result.combined()) {
            return Err(super::failed("verify", &result).into());
        }
        Ok(false)
    }

    /// `chezmoi archive --output=path`.
    ///
    /// # Errors
    ///
    /// Returns an error if chezmoi cannot be run or exits non-zero.
    pub fn archive(&self, output: &Path) -> Result<()> {
        let output = format!("--output={}", output.display());
        self.run("archive", ["archive".to_string(), output])?;
        Ok(())
    }
}
