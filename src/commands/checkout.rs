//! `gh checkout <pull request URL> [BRANCH]` checks out the head of a pull request

use anyhow::Result;

use super::{Context, Registration, Transform, git_url, protocol_for_repo, pull_request_url, sanitize_branch_name};
use crate::args::Args;
use crate::error::GhError;
use crate::github::project::Project;

/// Flags that pick their own branch and clash with a pull request
const CONFLICTING_FLAGS: [&str; 4] = ["-b", "-B", "--orphan", "--detach"];

pub struct CheckoutCommand;

pub fn registration() -> Registration {
    Registration {
        name: "checkout",
        usage: "checkout PULLREQ-URL [BRANCH]",
        long: "Checks out the head of the pull request as a local branch, to allow for\n\
               reviewing, rebasing and otherwise cleaning up the commits in the pull\n\
               request before merging. The name of the local branch can explicitly be\n\
               set with BRANCH.",
        git_extension: true,
        transformer: Box::new(CheckoutCommand),
    }
}

impl Transform for CheckoutCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        let words = args.words();
        let Some((position, (url, number))) = words
            .iter()
            .enumerate()
            .find_map(|(i, w)| pull_request_url(ctx, w).map(|found| (i, found)))
        else {
            return Ok(());
        };
        let word = &words[position];

        if let Some(flag) = CONFLICTING_FLAGS.iter().find(|f| args.has_flag(&[**f])) {
            return Err(GhError::UnsupportedFlag {
                flag: flag.to_string(),
                context: "a pull request URL".to_string(),
            }
            .into());
        }

        let pr = ctx.api.pull_request(&url.project, number)?;
        let branch = pr.head.git_ref.clone();

        let custom_name = words.get(position + 1).cloned();
        if let Some(name) = &custom_name
            && let Some(index) = args.index_of_param(name)
        {
            args.remove_param(index)?;
        }
        let index = args
            .index_of_param(word)
            .ok_or_else(|| GhError::MissingArgument("pull request URL".to_string()))?;

        match &pr.head.repo {
            Some(head_repo) => {
                let owner = head_repo.owner.login.clone();
                let head = Project::new(owner.as_str(), head_repo.name.as_str(), &url.project.host);
                let local = custom_name
                    .unwrap_or_else(|| sanitize_branch_name(&format!("{}-{}", owner, branch)));

                let remote = match ctx.repo.remote_for_repo(&head_repo.html_url) {
                    Ok(remote) => {
                        args.before(
                            "git",
                            ["remote", "set-branches", "--add", remote.name.as_str(), branch.as_str()],
                        );
                        remote.name
                    }
                    Err(_) => {
                        let protocol = protocol_for_repo(ctx, &head.host, head_repo.private);
                        let head_url = git_url(ctx, &head, protocol);
                        args.before(
                            "git",
                            ["remote", "add", "-t", branch.as_str(), owner.as_str(), head_url.as_str()],
                        );
                        owner
                    }
                };

                let refspec = format!("+refs/heads/{}:refs/remotes/{}/{}", branch, remote, branch);
                args.before("git", ["fetch", remote.as_str(), refspec.as_str()]);

                args.remove_param(index)?;
                args.insert_param(
                    index,
                    ["--track".to_string(), "-B".to_string(), local, format!("{}/{}", remote, branch)],
                )?;
            }
            None => {
                // The fork is gone; GitHub still serves the commits under refs/pull
                let local = custom_name.unwrap_or_else(|| {
                    sanitize_branch_name(&format!("{}-{}", pr.head_owner(), branch))
                });
                let source = match ctx.repo.remote_for_repo(&url.canonical_url()) {
                    Ok(remote) => remote.name,
                    Err(_) => {
                        let protocol = protocol_for_repo(ctx, &url.project.host, false);
                        git_url(ctx, &url.project, protocol)
                    }
                };
                tracing::debug!(%source, "head repository is gone, fetching the pull request ref");

                let refspec = format!("refs/pull/{}/head:{}", number, local);
                args.before("git", ["fetch", source.as_str(), refspec.as_str()]);
                args.replace_param(index, local)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::github::rest::Repository;

    const PR_URL: &str = "https://github.com/jingweno/gh/pull/73";

    fn fixture(remotes: &[(&str, &str)], head: Option<Repository>) -> Fixture {
        let mut fixture = Fixture::new(FakeGit::with_remotes(remotes));
        fixture.api.pulls = vec![(
            "jingweno/gh#73".to_string(),
            pull_request(73, head, "mislav:fix", "fix"),
        )];
        fixture
    }

    fn origin() -> (&'static str, &'static str) {
        ("origin", "git@github.com:jingweno/gh.git")
    }

    #[test]
    fn test_adds_remote_for_fork() {
        let fixture = fixture(&[origin()], Some(repository("mislav", "gh", false, false)));
        let commands = fixture
            .transform(&CheckoutCommand, &format!("checkout {}", PR_URL))
            .unwrap();
        assert_eq!(
            commands,
            [
                "git remote add -t fix mislav https://github.com/mislav/gh.git",
                "git fetch mislav +refs/heads/fix:refs/remotes/mislav/fix",
                "git checkout --track -B mislav-fix mislav/fix",
            ]
        );
    }

    #[test]
    fn test_reuses_existing_remote_and_custom_branch() {
        let fixture = fixture(
            &[origin(), ("mislav", "https://github.com/mislav/gh.git")],
            Some(repository("mislav", "gh", false, false)),
        );
        let commands = fixture
            .transform(&CheckoutCommand, &format!("checkout -q {} review", PR_URL))
            .unwrap();
        assert_eq!(
            commands,
            [
                "git remote set-branches --add mislav fix",
                "git fetch mislav +refs/heads/fix:refs/remotes/mislav/fix",
                "git checkout -q --track -B review mislav/fix",
            ]
        );
    }

    #[test]
    fn test_deleted_fork_fetches_pull_ref() {
        let fixture = fixture(&[origin()], None);
        let commands = fixture
            .transform(&CheckoutCommand, &format!("checkout {}", PR_URL))
            .unwrap();
        assert_eq!(
            commands,
            [
                "git fetch origin refs/pull/73/head:mislav-fix",
                "git checkout mislav-fix",
            ]
        );
    }

    #[test]
    fn test_deleted_fork_without_base_remote() {
        let fixture = fixture(&[("origin", "git@github.com:me/gh.git")], None);
        let commands = fixture
            .transform(&CheckoutCommand, &format!("checkout {}", PR_URL))
            .unwrap();
        assert_eq!(
            commands[0],
            "git fetch https://github.com/jingweno/gh.git refs/pull/73/head:mislav-fix"
        );
    }

    #[test]
    fn test_conflicting_flag() {
        let fixture = fixture(&[origin()], None);
        let err = fixture
            .transform(&CheckoutCommand, &format!("checkout -b topic {}", PR_URL))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<GhError>(),
            Some(&GhError::UnsupportedFlag {
                flag: "-b".to_string(),
                context: "a pull request URL".to_string(),
            })
        );
    }

    #[test]
    fn test_ordinary_checkout_untouched() {
        let fixture = fixture(&[origin()], None);
        for raw in [
            "checkout master",
            "checkout -b topic",
            "checkout https://github.com/jingweno/gh",
            "checkout",
        ] {
            let commands = fixture.transform(&CheckoutCommand, raw).unwrap();
            assert_eq!(commands, [format!("git {}", raw)]);
        }
    }
}
