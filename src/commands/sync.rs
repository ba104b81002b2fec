//! `gh sync` fetches the main remote and fast-forwards local branches tracking it

use anyhow::Result;

use super::{Context, Registration, Transform};
use crate::args::Args;

pub struct SyncCommand;

pub fn registration() -> Registration {
    Registration {
        name: "sync",
        usage: "sync",
        long: "Fetch from the \"upstream\" remote, or \"origin\" when there is none, and\n\
               fast-forward every local branch that tracks it. Branches that have\n\
               diverged are left alone.",
        git_extension: false,
        transformer: Box::new(SyncCommand),
    }
}

impl Transform for SyncCommand {
    fn transform(&self, args: &mut Args, ctx: &Context) -> Result<()> {
        let remote = match ctx.repo.remote("upstream")? {
            Some(remote) => remote,
            None => ctx.repo.main_remote()?,
        };
        let current = ctx.repo.current_branch().ok();
        let upstreams = ctx.repo.branch_upstreams()?;

        let mut fast_forward = None;
        let mut refspecs = Vec::new();
        let mut diverged = Vec::new();
        for upstream in upstreams.iter().filter(|u| u.remote == remote.name) {
            let Some(remote_branch) = upstream.merge.strip_prefix("refs/heads/") else {
                continue;
            };
            let tracking = format!("refs/remotes/{}/{}", remote.name, remote_branch);
            match ctx.repo.fast_forwards(&upstream.branch, &tracking) {
                Ok(true) => {}
                Ok(false) => {
                    diverged.push(format!(
                        "warning: {} has diverged from {}/{}, not updated",
                        upstream.branch, remote.name, remote_branch
                    ));
                    continue;
                }
                Err(e) => {
                    tracing::debug!("skipping {}: {:#}", upstream.branch, e);
                    continue;
                }
            }
            if current.as_deref() == Some(upstream.branch.as_str()) {
                fast_forward = Some(tracking);
            } else {
                refspecs.push(format!("{}:refs/heads/{}", tracking, upstream.branch));
            }
        }
        tracing::debug!(remote = %remote.name, branches = refspecs.len(), "syncing");

        args.replace("git", "fetch", ["--prune", "--quiet", remote.name.as_str()]);

        let git = |tail: Vec<String>| {
            let mut params = args.global_flags.clone();
            params.extend(tail);
            params
        };
        let mut queued = Vec::new();
        if let Some(tracking) = fast_forward {
            queued.push(git(vec![
                "merge".to_string(),
                "--ff-only".to_string(),
                "--quiet".to_string(),
                tracking,
            ]));
        }
        if !refspecs.is_empty() {
            let mut tail = vec!["fetch".to_string(), "--quiet".to_string(), ".".to_string()];
            tail.extend(refspecs);
            queued.push(git(tail));
        }
        for params in queued {
            args.after("git", params);
        }
        for warning in diverged {
            args.after("echo", [warning]);
        }

        Ok(())
    }
}
