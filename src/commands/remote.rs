//! `gh remote add [-p] OWNER[/NAME]` fills in the GitHub URL

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

use super::{Context, Registration, Transform, clone_protocol, git_url};
use crate::args::Args;
use crate::github::project::Project;

lazy_static! {
    static ref OWNER_NAME_RE: Regex = Regex::new(r"^([\w-]+)(?:/([\w.-]+))?$").unwrap();
}

pub struct RemoteCommand;

pub fn registration() -> Registration {
    Registration {
        name: "remote",
        usage: "remote add [-p] OPTIONS USER[/REPOSITORY]",
        long: "Add remote \"https://github.com/USER/REPOSITORY.git\" as with\n\
               git-remote(1). When /REPOSITORY is omitted, the basename of the\n\
               current GitHub project is used. With -p, use SSH. If USER is\n\
               \"origin\", your GitHub login is used instead.",
        git_extension: true,
        transformer: Box::new(RemoteCommand),
    }
}

impl Transform for RemoteCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        let words = args.words();
        let [sub, target] = words.as_slice() else {
            return Ok(());
        };
        if sub != "add" {
            return Ok(());
        }
        let Some(caps) = OWNER_NAME_RE.captures(target) else {
            return Ok(());
        };

        let current = ctx.repo.current_project().ok();
        let name = match (caps.get(2), &current) {
            (Some(name), _) => name.as_str().to_string(),
            (None, Some(current)) => current.name.clone(),
            (None, None) => {
                tracing::debug!("no GitHub project to take the repository name from");
                return Ok(());
            }
        };
        let host = current
            .as_ref()
            .map(|p| p.host.clone())
            .unwrap_or_else(|| ctx.config.default_hostname());

        let remote_name = caps[1].to_string();
        let owner = if remote_name == "origin" {
            ctx.config.default_host()?.user
        } else {
            remote_name.clone()
        };

        let force_ssh = args.take_flag(&["-p"]);
        let project = Project::new(owner, name, &host);
        let protocol = clone_protocol(ctx, &project, force_ssh);
        let url = git_url(ctx, &project, protocol);

        if let Some(index) = args.index_of_param(target) {
            args.replace_param(index, remote_name)?;
            args.insert_param(index + 1, [url])?;
        }

        Ok(())
    }
}
