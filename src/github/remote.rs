//! Git remotes and their GitHub projects

use super::project::Project;
use super::url::UrlParser;
use crate::error::GhError;

/// Remote names in descending publishing preference
pub const PREFERRED_REMOTES: [&str; 3] = ["upstream", "github", "origin"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub url: String,
}

impl Remote {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn project(&self, parser: &UrlParser) -> Result<Project, GhError> {
        parser.parse(&self.url).map(|url| url.project)
    }
}

/// Order remotes for publishing
///
/// Preferred names come in [`PREFERRED_REMOTES`] order. Every other remote
/// is inserted at the front as it is met, so the last configured
/// non-standard remote ends up first and all of them outrank the
/// preferred names.
pub fn rank_remotes(remotes: &[Remote]) -> Vec<Remote> {
    let mut ranked: Vec<Remote> = PREFERRED_REMOTES
        .iter()
        .filter_map(|name| remotes.iter().find(|r| r.name == *name).cloned())
        .collect();

    for remote in remotes {
        if !PREFERRED_REMOTES.contains(&remote.name.as_str()) {
            ranked.insert(0, remote.clone());
        }
    }

    ranked
}
