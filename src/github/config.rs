//! Saved GitHub host configuration
//!
//! File location: `$GH_CONFIG`, else `~/.config/gh`. Layout:
//!
//! ```yaml
//! github.com:
//!   - user: alice
//!     oauth_token: ghp_xxx
//!     protocol: https
//! ```
//!
//! `GITHUB_HOST`, `GITHUB_USER`, `GITHUB_TOKEN` and `GH_PROTOCOL` override
//! what the file says for the default host.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::project::{CloneProtocol, GITHUB_HOST, normalize_host};
use crate::error::GhError;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
struct HostEntry {
    #[serde(default)]
    user: String,
    #[serde(default, alias = "access_token")]
    oauth_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ssh_alias: Option<String>,
}

/// Credentials and preferences for one GitHub host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub host: String,
    pub user: String,
    pub access_token: String,
    pub protocol: Option<CloneProtocol>,
    pub ssh_alias: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    hosts: Vec<Host>,
    default_host: Option<String>,
    env_user: Option<String>,
    env_token: Option<String>,
    env_protocol: Option<CloneProtocol>,
    /// Why the config file was ignored, if it was
    load_error: Option<String>,
}

fn parse_protocol(value: &str) -> Option<CloneProtocol> {
    match value.trim().to_ascii_lowercase().as_str() {
        "https" => Some(CloneProtocol::Https),
        "ssh" => Some(CloneProtocol::Ssh),
        _ => None,
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Path to the gh configuration file
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = non_empty_env("GH_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".config").join("gh"))
}

impl Config {
    /// Load the file (if any) and apply environment overrides
    ///
    /// An unreadable file is logged and ignored so plain git commands keep
    /// working. The failure is reported once something asks for the user.
    pub fn load() -> Self {
        let mut config = match config_path() {
            Some(path) if path.exists() => Self::from_file(&path).unwrap_or_else(|e| {
                tracing::warn!("ignoring gh config: {:#}", e);
                Self {
                    load_error: Some(format!("{:#}", e)),
                    ..Self::default()
                }
            }),
            _ => Self::default(),
        };
        config.apply_env();
        config
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let raw: BTreeMap<String, Vec<HostEntry>> = serde_yaml::from_str(content)?;
        let hosts = raw
            .into_iter()
            .flat_map(|(host, entries)| {
                entries.into_iter().map(move |entry| Host {
                    host: normalize_host(&host),
                    user: entry.user,
                    access_token: entry.oauth_token,
                    protocol: entry.protocol.as_deref().and_then(parse_protocol),
                    ssh_alias: entry.ssh_alias.filter(|a| !a.is_empty()),
                })
            })
            .collect();

        Ok(Self {
            hosts,
            ..Self::default()
        })
    }

    fn apply_env(&mut self) {
        self.default_host = non_empty_env("GITHUB_HOST").map(|h| normalize_host(&h));
        self.env_user = non_empty_env("GITHUB_USER");
        self.env_token = non_empty_env("GITHUB_TOKEN");
        self.env_protocol = non_empty_env("GH_PROTOCOL").as_deref().and_then(parse_protocol);
    }

    pub fn default_hostname(&self) -> String {
        self.default_host
            .clone()
            .unwrap_or_else(|| GITHUB_HOST.to_string())
    }

    /// Host entry for `hostname` with environment overrides applied
    pub fn host(&self, hostname: &str) -> Host {
        let hostname = normalize_host(hostname);
        let mut host = self
            .hosts
            .iter()
            .find(|h| h.host == hostname)
            .cloned()
            .unwrap_or_else(|| Host {
                host: hostname.clone(),
                user: String::new(),
                access_token: String::new(),
                protocol: None,
                ssh_alias: None,
            });

        if hostname == self.default_hostname() {
            if let Some(user) = &self.env_user {
                host.user = user.clone();
            }
            if let Some(token) = &self.env_token {
                host.access_token = token.clone();
            }
        }
        if let Some(protocol) = self.env_protocol {
            host.protocol = Some(protocol);
        }
        host
    }

    /// The default host; fails when no user name is known for it
    pub fn default_host(&self) -> Result<Host, GhError> {
        let host = self.host(&self.default_hostname());
        if host.user.is_empty() {
            if let Some(err) = &self.load_error {
                return Err(GhError::BrokenConfig(err.clone()));
            }
            return Err(GhError::MissingUser(host.host));
        }
        Ok(host)
    }

    /// Hosts treated as GitHub when parsing URLs
    pub fn known_hosts(&self) -> Vec<String> {
        let mut known = vec![GITHUB_HOST.to_string()];
        let candidates = std::iter::once(self.default_hostname())
            .chain(self.hosts.iter().map(|h| h.host.clone()));
        for host in candidates {
            if !known.contains(&host) {
                known.push(host);
            }
        }
        known
    }

    pub fn protocol_for(&self, hostname: &str) -> Option<CloneProtocol> {
        self.host(hostname).protocol
    }
}
