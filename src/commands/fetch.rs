//! `gh fetch <user>` adds a remote for a collaborator's fork before fetching

use anyhow::Result;
use lazy_static::lazy_static;
use regex::Regex;

use super::{Context, Registration, Transform, git_url, protocol_for_repo};
use crate::args::Args;
use crate::github::project::Project;

lazy_static! {
    static ref OWNER_RE: Regex = Regex::new(r"^[\w-]+$").unwrap();
    static ref OWNER_LIST_RE: Regex = Regex::new(r"^[\w-]+(?:,[\w-]+)+$").unwrap();
}

pub struct FetchCommand;

pub fn registration() -> Registration {
    Registration {
        name: "fetch",
        usage: "fetch USER-1,[USER-2,...]",
        long: "Adds missing remote(s) with git remote add prior to fetching from them.",
        git_extension: true,
        transformer: Box::new(FetchCommand),
    }
}

impl Transform for FetchCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        expand_owner_list(args)?;

        let names = remote_names(args);
        if names.is_empty() {
            return Ok(());
        }

        let current = match ctx.repo.current_project() {
            Ok(project) => project,
            Err(e) => {
                tracing::debug!("fetch left alone: {:#}", e);
                return Ok(());
            }
        };

        let mut seen: Vec<&str> = Vec::new();
        for name in &names {
            if !OWNER_RE.is_match(name) || seen.contains(&name.as_str()) {
                continue;
            }
            seen.push(name);
            if ctx.repo.remote(name)?.is_some() {
                continue;
            }

            let project = Project::new(name.as_str(), current.name.as_str(), &current.host);
            match ctx.api.repository(&project) {
                Ok(repo) => {
                    let protocol = protocol_for_repo(ctx, &project.host, repo.private);
                    let url = git_url(ctx, &project, protocol);
                    args.before("git", ["remote", "add", name.as_str(), url.as_str()]);
                }
                Err(e) => tracing::debug!("no fork of {} for {}: {:#}", current, name, e),
            }
        }

        Ok(())
    }
}

/// `a,b` becomes `--multiple a b`
fn expand_owner_list(args: &mut Args) -> Result<()> {
    let Some(index) = args
        .params()
        .iter()
        .position(|p| !p.starts_with('-'))
    else {
        return Ok(());
    };

    let word = args.params()[index].clone();
    if !OWNER_LIST_RE.is_match(&word) {
        return Ok(());
    }

    args.remove_param(index)?;
    let mut tokens = vec!["--multiple"];
    tokens.extend(word.split(','));
    args.insert_param(index, tokens)?;
    Ok(())
}

/// Remote names the fetch will read from
fn remote_names(args: &Args) -> Vec<String> {
    match args.index_of_param("--multiple") {
        Some(index) => args.params()[index + 1..]
            .iter()
            .filter(|p| !p.starts_with('-'))
            .cloned()
            .collect(),
        None => args.words().into_iter().take(1).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn fixture() -> Fixture {
        let mut fixture = Fixture::new(FakeGit::with_remotes(&[(
            "origin",
            "git@github.com:jingweno/gh.git",
        )]));
        fixture.api.repos = vec![
            repository("mislav", "gh", false, false),
            repository("alice", "gh", true, true),
        ];
        fixture
    }

    #[test]
    fn test_adds_missing_remote() {
        let commands = fixture().transform(&FetchCommand, "fetch mislav").unwrap();
        assert_eq!(
            commands,
            [
                "git remote add mislav https://github.com/mislav/gh.git",
                "git fetch mislav",
            ]
        );
    }

    #[test]
    fn test_private_fork_uses_ssh() {
        let commands = fixture().transform(&FetchCommand, "fetch alice").unwrap();
        assert_eq!(
            commands,
            ["git remote add alice git@github.com:alice/gh.git", "git fetch alice"]
        );
    }

    #[test]
    fn test_owner_list() {
        let commands = fixture()
            .transform(&FetchCommand, "fetch --prune mislav,alice,origin")
            .unwrap();
        assert_eq!(
            commands,
            [
                "git remote add mislav https://github.com/mislav/gh.git",
                "git remote add alice git@github.com:alice/gh.git",
                "git fetch --prune --multiple mislav alice origin",
            ]
        );
    }

    #[test]
    fn test_multiple_deduplicates_names() {
        let commands = fixture()
            .transform(&FetchCommand, "fetch --multiple mislav mislav")
            .unwrap();
        assert_eq!(
            commands,
            [
                "git remote add mislav https://github.com/mislav/gh.git",
                "git fetch --multiple mislav mislav",
            ]
        );
    }

    #[test]
    fn test_existing_and_unknown_names_untouched() {
        let fixture = fixture();
        for raw in ["fetch origin", "fetch nobody", "fetch", "fetch origin master"] {
            let commands = fixture.transform(&FetchCommand, raw).unwrap();
            assert_eq!(commands, [format!("git {}", raw)]);
        }
    }

    #[test]
    fn test_api_failure_is_skipped() {
        let mut fixture = fixture();
        fixture.api.offline = true;
        let commands = fixture.transform(&FetchCommand, "fetch mislav").unwrap();
        assert_eq!(commands, ["git fetch mislav"]);
    }

    #[test]
    fn test_outside_repository_untouched() {
        let fixture = Fixture::new(FakeGit::default());
        let commands = fixture.transform(&FetchCommand, "fetch mislav").unwrap();
        assert_eq!(commands, ["git fetch mislav"]);
    }
}
