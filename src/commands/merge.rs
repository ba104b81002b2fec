//! `gh merge <pull request URL>` merges a pull request with a GitHub-style message

use anyhow::Result;

use super::{Context, Registration, Transform, git_url, protocol_for_repo, pull_request_url};
use crate::args::Args;
use crate::error::GhError;
use crate::github::project::Project;

/// Flags that already say how to fast-forward
const FAST_FORWARD_FLAGS: [&str; 4] = ["--ff", "--ff-only", "--no-ff", "--squash"];

pub struct MergeCommand;

pub fn registration() -> Registration {
    Registration {
        name: "merge",
        usage: "merge PULLREQ-URL",
        long: "Merge the pull request with a commit message that includes the pull\n\
               request ID and title, similar to the GitHub Merge Button.",
        git_extension: true,
        transformer: Box::new(MergeCommand),
    }
}

impl Transform for MergeCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        let words = args.words();
        let Some((word, (url, number))) = words
            .iter()
            .find_map(|w| pull_request_url(ctx, w).map(|found| (w, found)))
        else {
            return Ok(());
        };

        if ctx.repo.has_file(&["MERGE_HEAD"]) {
            return Err(GhError::MergeInProgress.into());
        }

        let pr = ctx.api.pull_request(&url.project, number)?;
        let Some(head_repo) = &pr.head.repo else {
            return Err(GhError::ForkNotAvailable(pr.head_owner().to_string()).into());
        };

        let owner = head_repo.owner.login.as_str();
        let branch = pr.head.git_ref.as_str();
        let head = Project::new(owner, head_repo.name.as_str(), &url.project.host);
        let protocol = protocol_for_repo(ctx, &head.host, head_repo.private);
        let head_url = git_url(ctx, &head, protocol);
        let head_ref = format!("refs/heads/{}", branch);
        args.before("git", ["fetch", head_url.as_str(), head_ref.as_str()]);

        let message = format!(
            "Merge pull request #{} from {}/{}\n\n{}",
            pr.number, owner, branch, pr.title
        );

        let index = args
            .index_of_param(word)
            .ok_or_else(|| GhError::MissingArgument("pull request URL".to_string()))?;
        let fast_forward_given = args.has_flag(&FAST_FORWARD_FLAGS);
        args.replace_param(index, "FETCH_HEAD")?;

        let mut inserted = Vec::new();
        if !fast_forward_given {
            inserted.push("--no-ff".to_string());
        }
        inserted.push("-m".to_string());
        inserted.push(message);
        args.insert_param(index + 1, inserted)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::github::rest::Repository;

    const PR_URL: &str = "https://github.com/jingweno/gh/pull/73";

    fn fixture(head: Option<Repository>) -> Fixture {
        let mut fixture = Fixture::new(FakeGit::with_remotes(&[(
            "origin",
            "git@github.com:jingweno/gh.git",
        )]));
        fixture.api.pulls = vec![(
            "jingweno/gh#73".to_string(),
            pull_request(73, head, "mislav:fix", "fix"),
        )];
        fixture
    }

    #[test]
    fn test_merge_pull_request() {
        let fixture = fixture(Some(repository("mislav", "gh", false, false)));
        let commands = fixture
            .transform(&MergeCommand, &format!("merge {}", PR_URL))
            .unwrap();
        assert_eq!(
            commands,
            [
                "git fetch https://github.com/mislav/gh.git refs/heads/fix",
                "git merge FETCH_HEAD --no-ff -m 'Merge pull request #73 from mislav/fix\n\nFix the thing'",
            ]
        );
    }

    #[test]
    fn test_explicit_fast_forward_choice_kept() {
        let fixture = fixture(Some(repository("mislav", "gh", true, false)));
        let args = fixture
            .args(&MergeCommand, &format!("merge --squash {}", PR_URL))
            .unwrap();
        assert_eq!(args.params()[..3], ["--squash", "FETCH_HEAD", "-m"]);
        assert!(!args.has_flag(&["--no-ff"]));

        let fetch = args.commands()[0].to_string();
        assert_eq!(fetch, "git fetch git@github.com:mislav/gh.git refs/heads/fix");
    }

    #[test]
    fn test_deleted_fork_queues_nothing() {
        let fixture = fixture(None);
        let err = fixture
            .transform(&MergeCommand, &format!("merge {}", PR_URL))
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<GhError>(),
            Some(&GhError::ForkNotAvailable("mislav".to_string()))
        );
    }

    #[test]
    fn test_merge_in_progress() {
        let mut fixture = fixture(Some(repository("mislav", "gh", false, false)));
        fixture.git.files = vec!["MERGE_HEAD".to_string()];
        let err = fixture
            .transform(&MergeCommand, &format!("merge {}", PR_URL))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<GhError>(), Some(&GhError::MergeInProgress));
    }

    #[test]
    fn test_ordinary_merge_untouched() {
        let fixture = fixture(None);
        for raw in ["merge topic", "merge --abort", "merge https://github.com/jingweno/gh"] {
            let commands = fixture.transform(&MergeCommand, raw).unwrap();
            assert_eq!(commands, [format!("git {}", raw)]);
        }
    }
}
