//! Git configuration reader
//!
//! Everything the resolver knows about the local checkout comes through
//! [`GitReader`]. [`GitCli`] answers by shelling out to `git`.

use anyhow::{Result, bail};
use std::path::PathBuf;

use crate::cmd::{Cmd, Runner};
use crate::error::GhError;

pub trait GitReader {
    /// `(name, url)` pairs in configuration order, fetch URLs preferred
    fn read_remotes(&self) -> Result<Vec<(String, String)>>;

    /// `git config --get-regexp` output as `"key value"` lines
    fn read_config(&self, pattern: &str) -> Result<Vec<String>>;

    /// Full ref of the checked out branch, e.g. `refs/heads/master`
    fn current_branch(&self) -> Result<String>;

    /// Resolve a ref such as `master@{upstream}` to its full name
    fn symbolic_full_name(&self, name: &str) -> Result<String>;

    /// Whether `descendant` contains every commit of `ancestor`
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;

    /// The `.git` directory of the current checkout
    fn dir(&self) -> Result<PathBuf>;

    fn has_file(&self, segments: &[&str]) -> bool {
        match self.dir() {
            Ok(dir) => segments
                .iter()
                .fold(dir, |path, segment| path.join(segment))
                .exists(),
            Err(_) => false,
        }
    }
}

/// [`GitReader`] backed by the `git` executable
pub struct GitCli<'a> {
    runner: &'a dyn Runner,
}

impl<'a> GitCli<'a> {
    pub fn new(runner: &'a dyn Runner) -> Self {
        Self { runner }
    }

    fn run_git(&self, args: &[&str]) -> Result<String> {
        let (stdout, code) = self.runner.spawn_capture(&Cmd::with_args("git", args.iter().copied()))?;
        if code != 0 {
            bail!("git {} exited with status {}", args.join(" "), code);
        }
        Ok(stdout)
    }
}

impl GitReader for GitCli<'_> {
    fn read_remotes(&self) -> Result<Vec<(String, String)>> {
        let output = self.run_git(&["remote", "-v"])?;
        Ok(parse_remote_lines(&output))
    }

    fn read_config(&self, pattern: &str) -> Result<Vec<String>> {
        // Exit status 1 just means no key matched
        let (stdout, code) = self
            .runner
            .spawn_capture(&Cmd::with_args("git", ["config", "--get-regexp", pattern]))?;
        if code != 0 && code != 1 {
            bail!("git config --get-regexp {} exited with status {}", pattern, code);
        }
        Ok(stdout
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    fn current_branch(&self) -> Result<String> {
        let output = self.run_git(&["symbolic-ref", "-q", "HEAD"])?;
        Ok(output.trim().to_string())
    }

    fn symbolic_full_name(&self, name: &str) -> Result<String> {
        let output = self.run_git(&["rev-parse", "--symbolic-full-name", name])?;
        let full = output.trim();
        if full.is_empty() {
            bail!("{} does not resolve to a ref", name);
        }
        Ok(full.to_string())
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let (_, code) = self.runner.spawn_capture(&Cmd::with_args(
            "git",
            ["merge-base", "--is-ancestor", ancestor, descendant],
        ))?;
        match code {
            0 => Ok(true),
            1 => Ok(false),
            _ => bail!("cannot compare {} with {}", ancestor, descendant),
        }
    }

    fn dir(&self) -> Result<PathBuf> {
        let (stdout, code) = self
            .runner
            .spawn_capture(&Cmd::with_args("git", ["rev-parse", "-q", "--git-dir"]))?;
        let dir = stdout.trim();
        if code != 0 || dir.is_empty() {
            return Err(GhError::NoGitDirectory.into());
        }
        Ok(PathBuf::from(dir))
    }
}

/// Parse `git remote -v` output, keeping one URL per remote
fn parse_remote_lines(output: &str) -> Vec<(String, String)> {
    let mut remotes: Vec<(String, String)> = Vec::new();

    for line in output.lines() {
        let mut parts = line.split_whitespace();
        let (Some(name), Some(url)) = (parts.next(), parts.next()) else {
            continue;
        };
        let is_fetch = parts.next() == Some("(fetch)");

        match remotes.iter_mut().find(|(n, _)| n == name) {
            Some(existing) if is_fetch => existing.1 = url.to_string(),
            Some(_) => {}
            None => remotes.push((name.to_string(), url.to_string())),
        }
    }

    remotes
}
