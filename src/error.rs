//! Typed failures raised by the resolver and the argument model
//!
//! Transformers and collaborators return `anyhow::Result`; these variants
//! travel inside it and can be recovered with `downcast_ref::<GhError>()`.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GhError {
    #[error("not a GitHub URL: {0}")]
    NotAGitHubUrl(String),

    #[error("not a git repository (or any of the parent directories)")]
    NoGitDirectory,

    #[error("no git remote resolves to a GitHub project")]
    NoRemote,

    #[error("no git remote points to {0}")]
    NoMatchingRemote(String),

    #[error("index {index} is out of range for {len} params")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{0}'s fork is not available anymore")]
    ForkNotAvailable(String),

    #[error("{flag} can't be used together with {context}")]
    UnsupportedFlag { flag: String, context: String },

    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("no GitHub user configured for {0}; set GITHUB_USER or add it to the gh config")]
    MissingUser(String),

    #[error("gh config is unusable: {0}")]
    BrokenConfig(String),

    #[error("a merge is already in progress")]
    MergeInProgress,

    #[error("repository {0} was not found on GitHub")]
    RepositoryNotFound(String),
}
