//! GitHub URL recognition
//!
//! Each URL family has one fixed pattern. Families are tried in
//! [`UrlShape::ALL`] order and the first match wins.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::config::Config;
use super::project::{Project, normalize_host};
use super::ssh_config::SshConfig;
use crate::error::GhError;

lazy_static! {
    static ref HTTPS_RE: Regex = Regex::new(
        r"^https?://(?:[^@/]+@)?(?P<host>[^/:@]+)(?::\d+)?/(?P<owner>[^/]+)/(?P<name>[^/?#]+?)(?:\.git)?(?:/(?P<path>[^?#]*?))?/?(?:[?#].*)?$"
    )
    .unwrap();
    static ref GIT_RE: Regex = Regex::new(
        r"^git://(?P<host>[^/:@]+)(?::\d+)?/(?P<owner>[^/]+)/(?P<name>[^/]+?)(?:\.git)?(?:/(?P<path>.*?))?/?$"
    )
    .unwrap();
    static ref SSH_RE: Regex = Regex::new(
        r"^(?:ssh://(?:[^@/]+@)?(?P<shost>[^/:@]+)(?::\d+)?/|(?:[^@/:]+@)?(?P<host>[^/:@]+):/?)(?P<owner>[^/]+)/(?P<name>[^/]+?)(?:\.git)?/?$"
    )
    .unwrap();
}

/// The URL families a remote can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlShape {
    Https,
    Git,
    Ssh,
}

impl UrlShape {
    pub const ALL: [UrlShape; 3] = [UrlShape::Https, UrlShape::Git, UrlShape::Ssh];

    fn pattern(self) -> &'static Regex {
        match self {
            UrlShape::Https => &HTTPS_RE,
            UrlShape::Git => &GIT_RE,
            UrlShape::Ssh => &SSH_RE,
        }
    }
}

/// A parsed GitHub URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubUrl {
    pub shape: UrlShape,
    pub project: Project,
    /// Path below the project, e.g. `pull/73`; empty for plain remotes
    pub path: String,
}

impl GitHubUrl {
    pub fn canonical_url(&self) -> String {
        self.project.web_url()
    }

    /// Pull request number when the path is `pull/<n>[/...]`
    pub fn pull_request_id(&self) -> Option<u64> {
        let mut parts = self.path.split('/');
        if parts.next() != Some("pull") {
            return None;
        }
        parts.next()?.parse().ok()
    }
}

/// Matches URLs against the known GitHub hosts, resolving SSH aliases
#[derive(Debug, Clone)]
pub struct UrlParser {
    ssh: SshConfig,
    known_hosts: Vec<String>,
}

impl UrlParser {
    pub fn new(ssh: SshConfig, known_hosts: Vec<String>) -> Self {
        Self {
            ssh,
            known_hosts: known_hosts.iter().map(|h| normalize_host(h)).collect(),
        }
    }

    pub fn from_config(config: &Config, ssh: SshConfig) -> Self {
        Self::new(ssh, config.known_hosts())
    }

    pub fn parse(&self, raw: &str) -> Result<GitHubUrl, GhError> {
        let raw = raw.trim();
        for shape in UrlShape::ALL {
            if let Some(caps) = shape.pattern().captures(raw) {
                return self.project_from(shape, &caps, raw);
            }
        }
        Err(GhError::NotAGitHubUrl(raw.to_string()))
    }

    fn project_from(&self, shape: UrlShape, caps: &Captures, raw: &str) -> Result<GitHubUrl, GhError> {
        let host = caps
            .name("host")
            .or_else(|| caps.name("shost"))
            .map(|m| m.as_str())
            .unwrap_or_default();

        let host = match shape {
            UrlShape::Ssh => normalize_host(&self.ssh.resolve(host)),
            _ => normalize_host(host),
        };
        if !self.known_hosts.contains(&host) {
            return Err(GhError::NotAGitHubUrl(raw.to_string()));
        }

        let owner = &caps["owner"];
        let name = &caps["name"];
        if name.is_empty() || name == ".git" {
            return Err(GhError::NotAGitHubUrl(raw.to_string()));
        }

        Ok(GitHubUrl {
            shape,
            project: Project::new(owner, name, &host),
            path: caps
                .name("path")
                .map(|m| m.as_str().trim_end_matches('/').to_string())
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> UrlParser {
        let mut ssh = SshConfig::default();
        ssh.read_str("Host gh\n  HostName github.com\nHost other\n  HostName gitlab.com\n");
        UrlParser::new(ssh, vec!["github.com".to_string(), "git.corp.com".to_string()])
    }

    #[test]
    fn test_parse_families() {
        let parser = parser();
        let cases = [
            ("https://github.com/jingweno/gh.git", UrlShape::Https),
            ("https://github.com/jingweno/gh", UrlShape::Https),
            ("http://user@github.com/jingweno/gh/", UrlShape::Https),
            ("git://github.com/jingweno/gh.git", UrlShape::Git),
            ("git@github.com:jingweno/gh.git", UrlShape::Ssh),
            ("github.com:jingweno/gh", UrlShape::Ssh),
            ("ssh://git@github.com/jingweno/gh.git", UrlShape::Ssh),
            ("ssh://git@ssh.github.com:443/jingweno/gh.git", UrlShape::Ssh),
        ];

        for (raw, shape) in cases {
            let url = parser.parse(raw).unwrap_or_else(|e| panic!("{}: {}", raw, e));
            assert_eq!(url.shape, shape, "{}", raw);
            assert_eq!(url.project, Project::new("jingweno", "gh", "github.com"), "{}", raw);
            assert!(url.path.is_empty(), "{}", raw);
        }
    }

    #[test]
    fn test_case_preserved() {
        let url = parser().parse("git@GitHub.com:JingWeno/GH.git").unwrap();
        assert_eq!(url.project.owner, "JingWeno");
        assert_eq!(url.project.name, "GH");
        assert_eq!(url.project.host, "github.com");
    }

    #[test]
    fn test_ssh_alias_resolved() {
        let url = parser().parse("git@gh:jingweno/gh.git").unwrap();
        assert_eq!(url.project.host, "github.com");
        assert_eq!(url.project, Project::new("jingweno", "gh", ""));
    }

    #[test]
    fn test_alias_to_foreign_host_rejected() {
        assert!(parser().parse("git@other:jingweno/gh.git").is_err());
    }

    #[test]
    fn test_not_github() {
        let parser = parser();
        for raw in [
            "not a url",
            "../gh",
            "/tmp/gh",
            "gh",
            "jingweno/gh",
            "https://gitlab.com/jingweno/gh",
            "https://github.com/jingweno",
            "ftp://github.com/jingweno/gh",
        ] {
            assert_eq!(
                parser.parse(raw),
                Err(GhError::NotAGitHubUrl(raw.to_string())),
                "{}",
                raw
            );
        }
    }

    #[test]
    fn test_enterprise_host() {
        let url = parser().parse("https://git.corp.com/team/app.git").unwrap();
        assert_eq!(url.project.host, "git.corp.com");
    }

    #[test]
    fn test_pull_request_path() {
        let parser = parser();
        let url = parser.parse("https://github.com/jingweno/gh/pull/73").unwrap();
        assert_eq!(url.path, "pull/73");
        assert_eq!(url.pull_request_id(), Some(73));

        let url = parser.parse("https://github.com/jingweno/gh/pull/73/files").unwrap();
        assert_eq!(url.pull_request_id(), Some(73));

        let url = parser.parse("https://github.com/jingweno/gh/issues/73").unwrap();
        assert_eq!(url.pull_request_id(), None);

        let url = parser.parse("https://github.com/jingweno/gh/pull/abc").unwrap();
        assert_eq!(url.pull_request_id(), None);

        let url = parser
            .parse("https://github.com/jingweno/gh/pull/73#issuecomment-1")
            .unwrap();
        assert_eq!(url.project.name, "gh");
        assert_eq!(url.pull_request_id(), Some(73));

        let url = parser
            .parse("https://github.com/jingweno/gh/pull/73/files?w=1")
            .unwrap();
        assert_eq!(url.pull_request_id(), Some(73));

        let url = parser.parse("https://github.com/jingweno/gh?tab=readme").unwrap();
        assert_eq!(url.project.name, "gh");
        assert_eq!(url.path, "");
    }

    #[test]
    fn test_canonical_round_trip() {
        let parser = parser();
        for raw in [
            "git@github.com:jingweno/gh.git",
            "git://github.com/jingweno/gh.git",
            "https://github.com/JingWeno/GH",
            "https://github.com/jingweno/gh/pull/1",
        ] {
            let first = parser.parse(raw).unwrap();
            let second = parser.parse(&first.canonical_url()).unwrap();
            assert_eq!(first.project, second.project, "{}", raw);
        }
    }
}
