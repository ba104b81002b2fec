//! `gh fork [--no-remote]` forks the current project under the configured user

use anyhow::{Result, bail};

use super::{Context, Registration, Transform, git_url, protocol_for_repo};
use crate::args::Args;
use crate::error::GhError;
use crate::github::project::Project;

pub struct ForkCommand;

pub fn registration() -> Registration {
    Registration {
        name: "fork",
        usage: "fork [--no-remote]",
        long: "Forks the original project (referenced by \"origin\" remote) on GitHub and\n\
               adds a new remote for it under your username.",
        git_extension: false,
        transformer: Box::new(ForkCommand),
    }
}

impl Transform for ForkCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        let no_remote = args.take_flag(&["--no-remote"]);
        let user = ctx.config.default_host()?.user;

        let mut own_repo = None;
        let mut source = None;
        for remote in ctx.repo.remotes_by_preference()? {
            let Ok(project) = remote.project(ctx.parser()) else {
                continue;
            };
            if project.owner.eq_ignore_ascii_case(&user) {
                own_repo.get_or_insert(project);
            } else {
                source = Some(project);
                break;
            }
        }
        let source = match (source, own_repo) {
            (Some(source), _) => source,
            (None, Some(own)) => bail!("can't fork {}: it is already your own repository", own),
            (None, None) => return Err(GhError::NoRemote.into()),
        };

        let mut fork = Project::new(user.as_str(), source.name.as_str(), &source.host);
        if ctx.api.repository_exists(&fork)? {
            args.before("echo", [format!("{} already exists on {}", fork, fork.host)]);
        } else if !args.is_noop() {
            let repo = ctx.api.create_fork(&source)?;
            tracing::info!(source = %source, fork = %repo.full_name, "forked repository");
            fork = Project::new(repo.owner.login, repo.name, &source.host);
        }

        args.no_forward();
        if no_remote || ctx.repo.remote_for_project(&fork).is_ok() {
            return Ok(());
        }

        let protocol = protocol_for_repo(ctx, &fork.host, true);
        let url = git_url(ctx, &fork, protocol);
        args.after("git", ["remote", "add", "-f", user.as_str(), url.as_str()]);
        args.after("echo", [format!("new remote: {}", user)]);

        Ok(())
    }
}
