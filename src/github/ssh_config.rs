//! SSH client configuration: host aliases
//!
//! Only `Host` and `HostName` directives matter. Every `HostName` applies
//! to the aliases of the `Host` line above it, with `%h` expanded to the
//! alias itself. The first definition for an alias wins, as in ssh.

use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref DIRECTIVE_RE: Regex =
        Regex::new(r"^\s*(?i:(host|hostname))(?:\s*=\s*|\s+)(.+?)\s*$").unwrap();
}

/// Alias → canonical hostname
#[derive(Debug, Clone, Default)]
pub struct SshConfig {
    hosts: HashMap<String, String>,
}

impl SshConfig {
    /// Read the user's and the system-wide config, user file first
    pub fn load() -> Self {
        let mut files: Vec<PathBuf> = Vec::new();
        if let Some(home) = dirs::home_dir() {
            files.push(home.join(".ssh").join("config"));
        }
        files.push(PathBuf::from("/etc/ssh/ssh_config"));

        let mut config = Self::default();
        for file in files {
            if !file.exists() {
                continue;
            }
            if let Err(e) = config.read_file(&file) {
                tracing::warn!("ignoring {}: {:#}", file.display(), e);
            }
        }
        config
    }

    pub fn read_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        self.read_str(&content);
        Ok(())
    }

    pub fn read_str(&mut self, content: &str) {
        let mut aliases: Vec<String> = vec!["*".to_string()];

        for line in content.lines() {
            let Some(caps) = DIRECTIVE_RE.captures(line) else {
                continue;
            };
            let values: Vec<&str> = caps[2].split_whitespace().collect();

            if caps[1].eq_ignore_ascii_case("host") {
                aliases = values.iter().map(|v| v.to_string()).collect();
                continue;
            }

            let Some(hostname) = values.first() else {
                continue;
            };
            for alias in &aliases {
                if alias.contains(['*', '?', '!']) {
                    continue;
                }
                self.hosts
                    .entry(alias.to_ascii_lowercase())
                    .or_insert_with(|| hostname.replace("%h", alias).to_ascii_lowercase());
            }
        }
    }

    /// Canonical hostname for an alias, or the input when none is declared
    pub fn resolve(&self, host: &str) -> String {
        let key = host.to_ascii_lowercase();
        self.hosts.get(&key).cloned().unwrap_or(key)
    }
}
