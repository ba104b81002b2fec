//! `gh create [-p] [-d DESC] [-h URL] [NAME]` creates the GitHub repository for this checkout

use anyhow::{Context as _, Result};

use super::{Context, Registration, Transform, git_url, protocol_for_repo, sanitize_repo_name};
use crate::args::Args;
use crate::error::GhError;
use crate::github::project::Project;
use crate::github::rest::CreateRepositoryRequest;

pub struct CreateCommand;

pub fn registration() -> Registration {
    Registration {
        name: "create",
        usage: "create [-p] [-d DESCRIPTION] [-h HOMEPAGE] [[ORGANIZATION/]NAME]",
        long: "Create a new public GitHub repository from the current git repository\n\
               and add remote origin at \"git@github.com:USER/REPOSITORY.git\". With -p,\n\
               create a private repository. The repository name defaults to the name\n\
               of the current directory.",
        git_extension: false,
        transformer: Box::new(CreateCommand),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Transform for CreateCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        ctx.repo
            .git_dir()
            .context("'create' must be run from inside a git repository")?;

        let private = args.take_flag(&["-p"]);
        let description = non_empty(args.take_flag_value(&["-d"]));
        let homepage = non_empty(args.take_flag_value(&["-h"]));

        if let Some(flag) = args.params().iter().find(|p| p.starts_with('-')) {
            return Err(GhError::UnsupportedFlag {
                flag: flag.clone(),
                context: "create".to_string(),
            }
            .into());
        }

        let mut project = target_project(args.first_param(), ctx)?;
        if project.name.is_empty() {
            return Err(GhError::MissingArgument("repository name".to_string()).into());
        }

        if ctx.api.repository_exists(&project)? {
            args.before(
                "echo",
                [format!("{} already exists on {}", project, project.host)],
            );
        } else if !args.is_noop() {
            let request = CreateRepositoryRequest {
                name: project.name.clone(),
                description,
                homepage,
                private,
            };
            let repo = ctx.api.create_repository(&project, &request)?;
            tracing::info!(repository = %repo.full_name, "created repository");
            project = Project::new(repo.owner.login, repo.name, &project.host);
        }

        args.no_forward();

        if ctx.repo.remote("origin")?.is_none() {
            let protocol = protocol_for_repo(ctx, &project.host, true);
            let url = git_url(ctx, &project, protocol);
            args.after("git", ["remote", "add", "-f", "origin", url.as_str()]);
        }
        args.after("echo", [project.web_url()]);

        Ok(())
    }
}

/// `owner/name`, a bare name under the current user, or the directory name
fn target_project(arg: Option<&str>, ctx: &Context) -> Result<Project> {
    if let Some(arg) = arg
        && arg.contains('/')
    {
        return Project::from_name_with_owner(arg, &ctx.config.default_hostname())
            .ok_or_else(|| GhError::MissingArgument(format!("repository name in {:?}", arg)).into());
    }

    let host = ctx.config.default_host()?;
    let name = match arg {
        Some(name) => name.to_string(),
        None => {
            let cwd = std::env::current_dir().context("Failed to read the current directory")?;
            let dir = cwd
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            sanitize_repo_name(&dir)
        }
    };

    Ok(Project::new(host.user, name, &host.host))
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;

    fn created(fixture: &Fixture) -> Vec<String> {
        fixture.api.created.borrow().clone()
    }

    #[test]
    fn test_create_named_repository() {
        let fixture = Fixture::new(FakeGit::with_remotes(&[]));
        let commands = fixture.transform(&CreateCommand, "create gh-new").unwrap();

        assert_eq!(created(&fixture), ["repo alice/gh-new"]);
        assert_eq!(
            commands,
            [
                "git remote add -f origin git@github.com:alice/gh-new.git",
                "echo https://github.com/alice/gh-new",
            ]
        );
    }

    #[test]
    fn test_create_in_organization_keeps_origin() {
        let fixture = Fixture::new(FakeGit::with_remotes(&[(
            "origin",
            "git@github.com:alice/tool.git",
        )]));
        let commands = fixture
            .transform(&CreateCommand, "create -p -d tooling acme/tool")
            .unwrap();

        assert_eq!(created(&fixture), ["repo acme/tool"]);
        assert_eq!(commands, ["echo https://github.com/acme/tool"]);
    }

    #[test]
    fn test_existing_repository_is_not_created() {
        let mut fixture = Fixture::new(FakeGit::with_remotes(&[]));
        fixture.api.repos = vec![repository("alice", "gh", false, true)];
        let commands = fixture.transform(&CreateCommand, "create gh").unwrap();

        assert!(created(&fixture).is_empty());
        assert_eq!(
            commands,
            [
                "echo 'alice/gh already exists on github.com'",
                "git remote add -f origin git@github.com:alice/gh.git",
                "echo https://github.com/alice/gh",
            ]
        );
    }

    #[test]
    fn test_noop_creates_nothing() {
        let fixture = Fixture::new(FakeGit::with_remotes(&[]));
        let args = fixture.args(&CreateCommand, "--noop create gh-new").unwrap();

        assert!(created(&fixture).is_empty());
        assert!(args.is_no_forward());
        assert_eq!(args.commands().len(), 2);
    }

    #[test]
    fn test_name_defaults_to_directory() {
        let fixture = Fixture::new(FakeGit::with_remotes(&[]));
        fixture.transform(&CreateCommand, "create").unwrap();

        let cwd = std::env::current_dir().unwrap();
        let dir = sanitize_repo_name(&cwd.file_name().unwrap().to_string_lossy());
        assert_eq!(created(&fixture), [format!("repo alice/{}", dir)]);
    }

    #[test]
    fn test_outside_repository() {
        let fixture = Fixture::new(FakeGit::default());
        let err = fixture.transform(&CreateCommand, "create gh").unwrap_err();
        assert_eq!(err.downcast_ref::<GhError>(), Some(&GhError::NoGitDirectory));
        assert!(err.to_string().contains("'create'"));
    }

    #[test]
    fn test_unknown_flag() {
        let fixture = Fixture::new(FakeGit::with_remotes(&[]));
        let err = fixture.transform(&CreateCommand, "create --org acme").unwrap_err();
        assert_eq!(
            err.downcast_ref::<GhError>(),
            Some(&GhError::UnsupportedFlag {
                flag: "--org".to_string(),
                context: "create".to_string(),
            })
        );
    }
}
