//! GitHub side of the wrapper: projects, URLs, remotes, config and the API

pub mod config;
pub mod localrepo;
pub mod project;
pub mod remote;
pub mod rest;
pub mod ssh_config;
pub mod url;
