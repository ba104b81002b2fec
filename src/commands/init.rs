//! `gh init -g [DIR]` initializes a repository with a GitHub origin

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};

use super::{Context, Registration, Transform, git_url, protocol_for_repo, sanitize_repo_name};
use crate::args::Args;
use crate::github::project::Project;

/// git init options whose value is the next token
const FLAGS_WITH_VALUE: [&str; 4] = ["--template", "--separate-git-dir", "-b", "--initial-branch"];

pub struct InitCommand;

pub fn registration() -> Registration {
    Registration {
        name: "init",
        usage: "init -g",
        long: "Create a git repository as with git-init(1) and add remote origin at\n\
               \"git@github.com:USER/REPOSITORY.git\"; USER is your GitHub login and\n\
               REPOSITORY is the current working directory's basename.",
        git_extension: true,
        transformer: Box::new(InitCommand),
    }
}

impl Transform for InitCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        if !args.take_flag(&["-g"]) {
            return Ok(());
        }

        let dir = target_dir(args)?;
        let basename = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let host = ctx.config.default_host()?;
        let project = Project::new(host.user, sanitize_repo_name(&basename), &host.host);
        let protocol = protocol_for_repo(ctx, &project.host, true);
        let url = git_url(ctx, &project, protocol);

        let git_dir = dir.join(".git").to_string_lossy().into_owned();
        args.after(
            "git",
            ["--git-dir", git_dir.as_str(), "remote", "add", "origin", url.as_str()],
        );

        match ctx.api.repository_exists(&project) {
            Ok(true) => {}
            Ok(false) => args.after(
                "echo",
                [format!(
                    "{} does not exist on {} yet; run gh create to create it",
                    project, project.host
                )],
            ),
            Err(e) => tracing::debug!("could not check {}: {:#}", project, e),
        }

        Ok(())
    }
}

/// Absolute path of the directory being initialized
fn target_dir(args: &Args) -> Result<PathBuf> {
    let mut dir = ".";
    let mut params = args.params().iter();
    while let Some(param) = params.next() {
        if FLAGS_WITH_VALUE.contains(&param.as_str()) {
            params.next();
        } else if !param.starts_with('-') {
            dir = param.as_str();
            break;
        }
    }

    let path = Path::new(dir);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .context("Failed to read the current directory")?
            .join(path)
    };

    Ok(path.canonicalize().unwrap_or(path))
}
