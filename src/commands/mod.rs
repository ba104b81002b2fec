//! Command registry and dispatcher
//!
//! A [`Registry`] holds every subcommand transformer in registration order.
//! [`run`] parses the raw arguments, lets each transformer registered under
//! the subcommand rewrite the shared [`Args`], then executes the resulting
//! command sequence, stopping at the first failure.

pub mod checkout;
pub mod clone;
pub mod create;
pub mod fetch;
pub mod fork;
pub mod init;
pub mod merge;
pub mod pull_request;
pub mod push;
pub mod remote;
pub mod sync;
pub mod version;

use anyhow::{Error, Result};

use crate::args::Args;
use crate::cmd::{Cmd, Runner};
use crate::git::GitReader;
use crate::github::config::Config;
use crate::github::localrepo::LocalRepo;
use crate::github::project::{CloneProtocol, Project};
use crate::github::rest::GitHubApi;
use crate::github::url::{GitHubUrl, UrlParser};

/// Rewrites the in-progress command for one subcommand
pub trait Transform {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()>;
}

pub struct Registration {
    pub name: &'static str,
    pub usage: &'static str,
    pub long: &'static str,
    /// Augments a real git command rather than being gh-only
    pub git_extension: bool,
    pub transformer: Box<dyn Transform>,
}

#[derive(Default)]
pub struct Registry {
    entries: Vec<Registration>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, registration: Registration) {
        self.entries.push(registration);
    }

    /// Every registration for `name`, in registration order
    pub fn lookup<'r>(&'r self, name: &str) -> impl Iterator<Item = &'r Registration> {
        self.entries.iter().filter(move |r| r.name == name)
    }

    pub fn find(&self, name: &str) -> Option<&Registration> {
        self.lookup(name).next()
    }
}

/// Register every built-in subcommand
pub fn register_all(registry: &mut Registry) {
    registry.register(clone::registration());
    registry.register(fetch::registration());
    registry.register(checkout::registration());
    registry.register(merge::registration());
    registry.register(create::registration());
    registry.register(init::registration());
    registry.register(remote::registration());
    registry.register(push::registration());
    registry.register(fork::registration());
    registry.register(pull_request::registration());
    registry.register(sync::registration());
    registry.register(version::registration());
}

/// External collaborators a run needs
pub struct Environment<'a> {
    pub runner: &'a dyn Runner,
    pub git: &'a dyn GitReader,
    pub api: &'a dyn GitHubApi,
    pub config: &'a Config,
    pub parser: &'a UrlParser,
}

/// What transformers get to look at
pub struct Context<'a> {
    pub repo: LocalRepo<'a>,
    pub config: &'a Config,
    pub api: &'a dyn GitHubApi,
}

impl<'a> Context<'a> {
    pub fn new(env: &Environment<'a>) -> Self {
        Self {
            repo: LocalRepo::new(env.git, env.parser),
            config: env.config,
            api: env.api,
        }
    }

    pub fn parser(&self) -> &UrlParser {
        self.repo.parser()
    }
}

/// Outcome of one invocation
#[derive(Debug)]
pub struct ExitResult {
    /// At least one subprocess was started
    pub ran: bool,
    pub exit_code: i32,
    pub error: Option<Error>,
}

impl ExitResult {
    fn success(ran: bool) -> Self {
        Self {
            ran,
            exit_code: 0,
            error: None,
        }
    }

    fn failed(error: Error) -> Self {
        Self {
            ran: false,
            exit_code: 1,
            error: Some(error),
        }
    }
}

/// Parse, transform and execute one invocation
pub fn run<S: AsRef<str>>(raw: &[S], registry: &Registry, env: &Environment) -> ExitResult {
    let mut args = Args::new(raw);

    if args.command == "help" && let Some(result) = help(&args, registry) {
        return result;
    }

    let ctx = Context::new(env);
    let command = args.command.clone();
    let mut matched = false;
    for registration in registry.lookup(&command) {
        matched = true;
        tracing::debug!(command = registration.name, "transforming");
        if let Err(e) = registration.transformer.transform(&mut args, &ctx) {
            return ExitResult::failed(e);
        }
    }
    if !matched {
        tracing::debug!(command = %args.command, "passing through to git");
    }

    execute(&args.commands(), args.is_noop(), env.runner)
}

/// Run commands in order, stopping at the first non-zero exit
fn execute(cmds: &[Cmd], noop: bool, runner: &dyn Runner) -> ExitResult {
    let mut ran = false;

    for cmd in cmds {
        if noop {
            println!("{}", cmd);
            continue;
        }

        ran = true;
        match runner.spawn(cmd) {
            Ok(0) => {}
            Ok(code) => {
                tracing::debug!(command = %cmd, code, "command failed");
                return ExitResult {
                    ran,
                    exit_code: code,
                    error: None,
                };
            }
            Err(e) => {
                return ExitResult {
                    ran,
                    exit_code: 1,
                    error: Some(e),
                };
            }
        }
    }

    ExitResult::success(ran)
}

/// `gh help <command>` for commands gh knows about
///
/// gh-only commands are answered here. For git extensions the gh notes are
/// printed and `git help` still runs.
fn help(args: &Args, registry: &Registry) -> Option<ExitResult> {
    let words = args.words();
    let registration = registry.find(words.first()?)?;

    println!("usage: gh {}\n\n{}", registration.usage, registration.long.trim_end());
    if registration.git_extension {
        println!();
        return None;
    }
    Some(ExitResult::success(false))
}

// ============================================================================
// Helpers shared by transformers
// ============================================================================

/// A pull request URL and its number; anything else yields `None`
pub(crate) fn pull_request_url(ctx: &Context, word: &str) -> Option<(GitHubUrl, u64)> {
    let url = ctx.parser().parse(word).ok()?;
    let number = url.pull_request_id()?;
    Some((url, number))
}

/// Protocol for a repository whose visibility is already known
pub(crate) fn protocol_for_repo(ctx: &Context, host: &str, private: bool) -> CloneProtocol {
    match ctx.config.protocol_for(host) {
        Some(protocol) => protocol,
        None if private => CloneProtocol::Ssh,
        None => CloneProtocol::Https,
    }
}

/// Protocol for cloning `project`, asking the API when nothing decides it
pub(crate) fn clone_protocol(ctx: &Context, project: &Project, force_ssh: bool) -> CloneProtocol {
    if force_ssh {
        return CloneProtocol::Ssh;
    }
    if let Some(protocol) = ctx.config.protocol_for(&project.host) {
        return protocol;
    }

    match ctx.api.repository(project) {
        Ok(repo) if repo.private || repo.can_push() => CloneProtocol::Ssh,
        Ok(_) => CloneProtocol::Https,
        Err(e) => {
            tracing::debug!("could not look up {}: {:#}", project, e);
            CloneProtocol::Https
        }
    }
}

/// Clone URL honoring the host's configured SSH alias
pub(crate) fn git_url(ctx: &Context, project: &Project, protocol: CloneProtocol) -> String {
    let host = ctx.config.host(&project.host);
    project.git_url_via(protocol, host.ssh_alias.as_deref())
}

/// Turn a directory name into a repository name
pub(crate) fn sanitize_repo_name(name: &str) -> String {
    name.trim()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
        .collect()
}

/// Make `name` acceptable to `git check-ref-format --branch`
pub(crate) fn sanitize_branch_name(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_control() || matches!(c, ' ' | '~' | '^' | ':' | '?' | '*' | '[' | '\\') {
                '-'
            } else {
                c
            }
        })
        .collect();

    while out.contains("..") {
        out = out.replace("..", ".");
    }
    out = out.replace("@{", "-{");

    let mut out = out
        .split('/')
        .map(|part| {
            let part = part.trim_start_matches('.');
            part.strip_suffix(".lock").unwrap_or(part).to_string()
        })
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    while out.ends_with('.') {
        out.pop();
    }
    if out.is_empty() || out == "@" || out.starts_with('-') {
        out = format!("pr{}", out);
    }
    out
}
