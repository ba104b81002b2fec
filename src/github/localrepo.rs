//! Resolve the local checkout to GitHub projects
//!
//! A [`LocalRepo`] reads remotes once and keeps them for its lifetime;
//! nothing is cached across invocations.

use anyhow::Result;
use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::project::Project;
use super::remote::{Remote, rank_remotes};
use super::url::UrlParser;
use crate::error::GhError;
use crate::git::GitReader;

/// Upstream configuration of one local branch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchUpstream {
    pub branch: String,
    pub remote: String,
    /// Full remote ref, e.g. `refs/heads/master`
    pub merge: String,
}

pub struct LocalRepo<'a> {
    git: &'a dyn GitReader,
    parser: &'a UrlParser,
    remotes: OnceCell<Vec<Remote>>,
}

impl<'a> LocalRepo<'a> {
    pub fn new(git: &'a dyn GitReader, parser: &'a UrlParser) -> Self {
        Self {
            git,
            parser,
            remotes: OnceCell::new(),
        }
    }

    pub fn parser(&self) -> &UrlParser {
        self.parser
    }

    pub fn git_dir(&self) -> Result<PathBuf> {
        self.git.dir()
    }

    pub fn has_file(&self, segments: &[&str]) -> bool {
        self.git.has_file(segments)
    }

    /// Remotes in configuration order
    pub fn remotes(&self) -> Result<&[Remote]> {
        if let Some(remotes) = self.remotes.get() {
            return Ok(remotes);
        }

        self.git.dir()?;
        let remotes: Vec<Remote> = self
            .git
            .read_remotes()?
            .into_iter()
            .map(|(name, url)| Remote::new(name, url))
            .collect();
        tracing::debug!(count = remotes.len(), "read git remotes");

        Ok(self.remotes.get_or_init(|| remotes))
    }

    pub fn remotes_by_preference(&self) -> Result<Vec<Remote>> {
        Ok(rank_remotes(self.remotes()?))
    }

    pub fn remote(&self, name: &str) -> Result<Option<Remote>> {
        Ok(self.remotes()?.iter().find(|r| r.name == name).cloned())
    }

    /// `origin` when configured, otherwise the first remote
    pub fn main_remote(&self) -> Result<Remote> {
        let remotes = self.remotes()?;
        remotes
            .iter()
            .find(|r| r.name == "origin")
            .or_else(|| remotes.first())
            .cloned()
            .ok_or_else(|| GhError::NoRemote.into())
    }

    /// Short name of the checked out branch
    pub fn current_branch(&self) -> Result<String> {
        let full = self.git.current_branch()?;
        Ok(full
            .strip_prefix("refs/heads/")
            .unwrap_or(&full)
            .to_string())
    }

    /// Remote the current branch tracks, if any
    fn upstream_remote(&self) -> Option<Remote> {
        let branch = self.current_branch().ok()?;
        let upstream = self
            .git
            .symbolic_full_name(&format!("{}@{{upstream}}", branch))
            .ok()?;
        let tracked = upstream.strip_prefix("refs/remotes/")?;

        // Remote names may contain slashes; the longest matching name wins
        self.remotes()
            .ok()?
            .iter()
            .filter(|r| tracked.starts_with(&format!("{}/", r.name)))
            .max_by_key(|r| r.name.len())
            .cloned()
    }

    /// Project of the current branch's upstream, else of the main remote
    pub fn current_project(&self) -> Result<Project> {
        let remotes = self.remotes()?;

        if let Some(remote) = self.upstream_remote() {
            match remote.project(self.parser) {
                Ok(project) => return Ok(project),
                Err(e) => tracing::debug!("upstream remote {} skipped: {}", remote.name, e),
            }
        }

        let main = self.main_remote()?;
        let candidates = std::iter::once(main.clone())
            .chain(rank_remotes(remotes).into_iter().filter(|r| r.name != main.name));
        for remote in candidates {
            if let Ok(project) = remote.project(self.parser) {
                return Ok(project);
            }
        }

        Err(GhError::NoRemote.into())
    }

    /// `upstream`'s project when it resolves, else the current project
    pub fn upstream_project(&self) -> Result<Project> {
        if let Some(remote) = self.remote("upstream")?
            && let Ok(project) = remote.project(self.parser)
        {
            return Ok(project);
        }
        self.current_project()
    }

    /// First remote whose project equals `project`
    pub fn remote_for_project(&self, project: &Project) -> Result<Remote> {
        self.remotes()?
            .iter()
            .find(|r| r.project(self.parser).as_ref() == Ok(project))
            .cloned()
            .ok_or_else(|| GhError::NoMatchingRemote(project.web_url()).into())
    }

    /// Remote for a repository given by its web URL
    pub fn remote_for_repo(&self, repo_url: &str) -> Result<Remote> {
        let url = self.parser.parse(repo_url)?;
        self.remote_for_project(&url.project)
    }

    /// Whether local `branch` can be fast-forwarded to `target`
    pub fn fast_forwards(&self, branch: &str, target: &str) -> Result<bool> {
        self.git.is_ancestor(&format!("refs/heads/{}", branch), target)
    }

    /// Upstream settings of every local branch that has both keys
    pub fn branch_upstreams(&self) -> Result<Vec<BranchUpstream>> {
        let lines = self.git.read_config(r"^branch\..*\.(remote|merge)$")?;
        let mut partial: BTreeMap<String, (Option<String>, Option<String>)> = BTreeMap::new();

        for line in lines {
            let Some((key, value)) = line.split_once(' ') else {
                continue;
            };
            let Some(rest) = key.strip_prefix("branch.") else {
                continue;
            };
            if let Some(branch) = rest.strip_suffix(".remote") {
                partial.entry(branch.to_string()).or_default().0 = Some(value.trim().to_string());
            } else if let Some(branch) = rest.strip_suffix(".merge") {
                partial.entry(branch.to_string()).or_default().1 = Some(value.trim().to_string());
            }
        }

        Ok(partial
            .into_iter()
            .filter_map(|(branch, entry)| match entry {
                (Some(remote), Some(merge)) => Some(BranchUpstream {
                    branch,
                    remote,
                    merge,
                }),
                _ => None,
            })
            .collect())
    }
}
