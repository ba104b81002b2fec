//! `gh pull-request -m MESSAGE [-b BASE] [-h HEAD]` opens a pull request

use anyhow::Result;

use super::{Context, Registration, Transform};
use crate::args::Args;
use crate::error::GhError;
use crate::github::project::Project;
use crate::github::rest::CreatePullRequestRequest;

const DEFAULT_BASE_BRANCH: &str = "master";

pub struct PullRequestCommand;

pub fn registration() -> Registration {
    Registration {
        name: "pull-request",
        usage: "pull-request -m MESSAGE [-b BASE] [-h HEAD]",
        long: "Opens a pull request on GitHub for the project that the \"upstream\"\n\
               remote points to, or \"origin\" when there is none. The first line of\n\
               MESSAGE is the title, the rest is the body. BASE defaults to the\n\
               repository's default branch and HEAD to the current branch. Both accept\n\
               OWNER:BRANCH to target another fork.",
        git_extension: false,
        transformer: Box::new(PullRequestCommand),
    }
}

/// Title and optional body of a pull request message
fn split_message(message: &str) -> (String, Option<String>) {
    let message = message.trim();
    match message.split_once('\n') {
        Some((title, body)) => {
            let body = body.trim();
            (
                title.trim().to_string(),
                (!body.is_empty()).then(|| body.to_string()),
            )
        }
        None => (message.to_string(), None),
    }
}

impl Transform for PullRequestCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        let message = args
            .take_flag_value(&["-m", "--message"])
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| GhError::MissingArgument("-m MESSAGE".to_string()))?;
        let base_flag = args.take_flag_value(&["-b", "--base"]);
        let head_flag = args.take_flag_value(&["-h", "--head"]);

        let mut base_project = ctx.repo.upstream_project()?;
        let base = match base_flag.as_deref() {
            Some(flag) => match flag.split_once(':') {
                Some((owner, branch)) => {
                    base_project = Project::new(owner, base_project.name.as_str(), &base_project.host);
                    branch.to_string()
                }
                None => flag.to_string(),
            },
            None => match ctx.api.repository(&base_project) {
                Ok(repo) => repo
                    .default_branch
                    .unwrap_or_else(|| DEFAULT_BASE_BRANCH.to_string()),
                Err(e) => {
                    tracing::debug!("default branch of {} unknown: {:#}", base_project, e);
                    DEFAULT_BASE_BRANCH.to_string()
                }
            },
        };

        let head = match head_flag {
            Some(flag) if flag.contains(':') => flag,
            Some(branch) => format!("{}:{}", ctx.repo.current_project()?.owner, branch),
            None => format!(
                "{}:{}",
                ctx.repo.current_project()?.owner,
                ctx.repo.current_branch()?
            ),
        };

        let (title, body) = split_message(&message);
        args.no_forward();

        if args.is_noop() {
            args.after(
                "echo",
                [format!("pull request on {}: {} <- {}: {}", base_project, base, head, title)],
            );
            return Ok(());
        }

        let request = CreatePullRequestRequest {
            title,
            body,
            base,
            head,
        };
        let pr = ctx.api.create_pull_request(&base_project, &request)?;
        tracing::info!(number = pr.number, "opened pull request");
        args.after("echo", [pr.html_url]);

        Ok(())
    }
}
