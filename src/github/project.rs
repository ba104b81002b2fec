//! GitHub project identity

use std::fmt;

pub const GITHUB_HOST: &str = "github.com";

/// Transport used when building a clone URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneProtocol {
    Https,
    Ssh,
}

/// A repository identified by owner, name and host
///
/// Host comparison ignores case; owner and name compare exactly.
#[derive(Debug, Clone, Eq)]
pub struct Project {
    pub owner: String,
    pub name: String,
    pub host: String,
}

impl Project {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, host: &str) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            host: normalize_host(host),
        }
    }

    /// Parse `owner/name`; the host defaults to `github.com`
    pub fn from_name_with_owner(nwo: &str, host: &str) -> Option<Self> {
        let (owner, name) = nwo.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name, host))
    }

    /// Canonical web URL, e.g. `https://github.com/jingweno/gh`
    pub fn web_url(&self) -> String {
        format!("https://{}/{}/{}", self.host, self.owner, self.name)
    }

    /// Clone URL, optionally addressing the SSH host through an alias
    pub fn git_url_via(&self, protocol: CloneProtocol, ssh_alias: Option<&str>) -> String {
        match protocol {
            CloneProtocol::Https => {
                format!("https://{}/{}/{}.git", self.host, self.owner, self.name)
            }
            CloneProtocol::Ssh => format!(
                "git@{}:{}/{}.git",
                ssh_alias.unwrap_or(&self.host),
                self.owner,
                self.name
            ),
        }
    }

    /// The repository a `.wiki` project belongs to
    pub fn without_wiki(&self) -> Self {
        match self.name.strip_suffix(".wiki") {
            Some(base) if !base.is_empty() => Self::new(&self.owner, base, &self.host),
            _ => self.clone(),
        }
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner
            && self.name == other.name
            && self.host.eq_ignore_ascii_case(&other.host)
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Lowercase a host, defaulting to github.com and folding `ssh.github.com`
pub fn normalize_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    match host.as_str() {
        "" => GITHUB_HOST.to_string(),
        "ssh.github.com" => GITHUB_HOST.to_string(),
        _ => host,
    }
}
