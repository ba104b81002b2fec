//! GitHub REST API client
//!
//! Handles the handful of repository and pull request endpoints the
//! transformers need. Retries and timeouts are left to reqwest defaults.

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};

use super::config::Config;
use super::project::{GITHUB_HOST, Project};
use crate::error::GhError;

const GITHUB_API_BASE: &str = "https://api.github.com";
const USER_AGENT_VALUE: &str = concat!("gh/", env!("CARGO_PKG_VERSION"));

/// GitHub API collaborator
pub trait GitHubApi {
    fn pull_request(&self, project: &Project, number: u64) -> Result<PullRequest>;

    fn repository(&self, project: &Project) -> Result<Repository>;

    fn repository_exists(&self, project: &Project) -> Result<bool>;

    fn create_repository(&self, project: &Project, options: &CreateRepositoryRequest) -> Result<Repository>;

    /// Fork `project` into the authenticated user's account
    fn create_fork(&self, project: &Project) -> Result<Repository>;

    fn create_pull_request(&self, project: &Project, req: &CreatePullRequestRequest) -> Result<PullRequest>;
}

/// API root for a host
pub fn api_base(host: &str) -> String {
    if host == GITHUB_HOST {
        GITHUB_API_BASE.to_string()
    } else {
        format!("https://{}/api/v3", host)
    }
}

fn repo_path(project: &Project) -> String {
    format!(
        "{}/repos/{}/{}",
        api_base(&project.host),
        urlencoding::encode(&project.owner),
        urlencoding::encode(&project.name)
    )
}

/// Blocking REST client; credentials are picked per host from [`Config`]
pub struct RestClient {
    client: Client,
    config: Config,
}

impl RestClient {
    pub fn new(config: Config) -> Result<Self> {
        let client = Client::builder()
            .default_headers(Self::default_headers())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers
    }

    fn authorize(&self, request: RequestBuilder, host: &str) -> Result<RequestBuilder> {
        let token = self.config.host(host).access_token;
        if token.is_empty() {
            return Ok(request);
        }
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("Invalid token format")?;
        Ok(request.header(AUTHORIZATION, value))
    }

    fn get(&self, url: &str, host: &str) -> Result<reqwest::blocking::Response> {
        tracing::debug!(%url, "GET");
        self.authorize(self.client.get(url), host)?
            .send()
            .with_context(|| format!("Failed to fetch {}", url))
    }

    fn post_json<T: Serialize, R: for<'de> Deserialize<'de>>(&self, url: &str, host: &str, body: &T) -> Result<R> {
        tracing::debug!(%url, "POST");
        self.authorize(self.client.post(url), host)?
            .json(body)
            .send()
            .context("Failed to execute POST request")?
            .error_for_status()
            .context("GitHub API error")?
            .json()
            .context("Failed to parse JSON response")
    }
}

impl GitHubApi for RestClient {
    fn pull_request(&self, project: &Project, number: u64) -> Result<PullRequest> {
        let url = format!("{}/pulls/{}", repo_path(project), number);

        self.get(&url, &project.host)?
            .error_for_status()
            .with_context(|| format!("Failed to load pull request #{} of {}", number, project))?
            .json()
            .context("Failed to parse pull request response")
    }

    fn repository(&self, project: &Project) -> Result<Repository> {
        let url = repo_path(project);
        let response = self.get(&url, &project.host)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(GhError::RepositoryNotFound(project.to_string()).into());
        }

        response
            .error_for_status()
            .context("GitHub API error")?
            .json()
            .context("Failed to parse repository response")
    }

    fn repository_exists(&self, project: &Project) -> Result<bool> {
        let response = self.get(&repo_path(project), &project.host)?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => {
                response.error_for_status().context("GitHub API error")?;
                Ok(false)
            }
        }
    }

    fn create_repository(&self, project: &Project, options: &CreateRepositoryRequest) -> Result<Repository> {
        let user = self.config.host(&project.host).user;
        let base = api_base(&project.host);
        let url = if project.owner == user {
            format!("{}/user/repos", base)
        } else {
            format!("{}/orgs/{}/repos", base, urlencoding::encode(&project.owner))
        };

        self.post_json(&url, &project.host, options)
            .with_context(|| format!("Failed to create repository {}", project))
    }

    fn create_fork(&self, project: &Project) -> Result<Repository> {
        let url = format!("{}/forks", repo_path(project));

        self.post_json(&url, &project.host, &serde_json::json!({}))
            .with_context(|| format!("Failed to fork {}", project))
    }

    fn create_pull_request(&self, project: &Project, req: &CreatePullRequestRequest) -> Result<PullRequest> {
        let url = format!("{}/pulls", repo_path(project));

        self.post_json(&url, &project.host, req)
            .with_context(|| format!("Failed to open a pull request on {}", project))
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub login: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Permissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

/// GitHub Repository
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub owner: UserRef,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub has_wiki: bool,
    #[serde(default)]
    pub permissions: Option<Permissions>,
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

impl Repository {
    pub fn can_push(&self) -> bool {
        self.permissions.as_ref().is_some_and(|p| p.push)
    }
}

/// One side of a pull request
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequestSide {
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub label: String,
    /// Absent when the fork has been deleted
    pub repo: Option<Repository>,
}

/// GitHub Pull Request
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub html_url: String,
    pub base: PullRequestSide,
    pub head: PullRequestSide,
}

impl PullRequest {
    /// Owner of the head branch, taken from `owner:branch`
    pub fn head_owner(&self) -> &str {
        match self.head.label.split_once(':') {
            Some((owner, _)) => owner,
            None => &self.head.label,
        }
    }
}

/// Request to create a repository
#[derive(Debug, Clone, Serialize)]
pub struct CreateRepositoryRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    pub private: bool,
}

/// Request to open a pull request
#[derive(Debug, Clone, Serialize)]
pub struct CreatePullRequestRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    pub base: String,
    pub head: String,
}
