//! `gh clone [-p] [owner/]repo` expands shorthand into a clone URL

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use super::{Context, Registration, Transform, clone_protocol, git_url};
use crate::args::Args;
use crate::github::project::Project;

lazy_static! {
    static ref NAME_WITH_OWNER_RE: Regex = Regex::new(r"^(?:([\w.-]+)/)?([\w.-]+)$").unwrap();
}

/// git clone options whose value is the next token
const FLAGS_WITH_VALUE: &[&str] = &[
    "--upload-pack",
    "--template",
    "--depth",
    "--shallow-since",
    "--shallow-exclude",
    "--origin",
    "--branch",
    "--reference",
    "--reference-if-able",
    "--name",
    "--separate-git-dir",
    "--config",
    "--jobs",
    "--server-option",
    "--bundle-uri",
    "--ref-format",
    "--filter",
    "-u",
    "-b",
    "-o",
    "-c",
    "-j",
];

pub struct CloneCommand;

pub fn registration() -> Registration {
    Registration {
        name: "clone",
        usage: "clone [-p] OPTIONS [USER/]REPOSITORY DIRECTORY",
        long: "Clone repository \"https://github.com/USER/REPOSITORY.git\" into\n\
               DIRECTORY as with git-clone(1). When USER/ is omitted, assumes\n\
               your GitHub login. With -p, clone private repositories over SSH.\n\
               For repositories under your GitHub login, -p is implicit.",
        git_extension: true,
        transformer: Box::new(CloneCommand),
    }
}

impl Transform for CloneCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        let force_ssh = args.take_flag(&["-p"]);

        let mut i = 0;
        while i < args.params_len() {
            let param = args.params()[i].clone();
            if param.starts_with('-') {
                if FLAGS_WITH_VALUE.contains(&param.as_str()) {
                    i += 1;
                }
                i += 1;
                continue;
            }

            if let Some(url) = expand(&param, ctx, force_ssh)? {
                tracing::debug!(from = %param, to = %url, "expanded clone shorthand");
                args.replace_param(i, url)?;
            }
            break;
        }

        Ok(())
    }
}

/// Clone URL for a `[owner/]name` token, `None` when it isn't shorthand
fn expand(token: &str, ctx: &Context, force_ssh: bool) -> Result<Option<String>> {
    let Some(caps) = NAME_WITH_OWNER_RE.captures(token) else {
        return Ok(None);
    };
    if Path::new(token).is_dir() {
        return Ok(None);
    }

    let name = &caps[2];
    let (owner, host) = match caps.get(1) {
        // `../repo` and friends are paths, not owners
        Some(owner) if owner.as_str().chars().all(|c| c == '.') => return Ok(None),
        Some(owner) => (owner.as_str().to_string(), ctx.config.default_hostname()),
        None => {
            let host = ctx.config.default_host()?;
            (host.user, host.host)
        }
    };

    let project = Project::new(owner, name, &host);
    let protocol = clone_protocol(ctx, &project.without_wiki(), force_ssh);
    Ok(Some(git_url(ctx, &project, protocol)))
}
