//! `gh push a,b,c REFS` pushes to several remotes in one go

use anyhow::Result;

use super::{Context, Registration, Transform};
use crate::args::Args;

pub struct PushCommand;

pub fn registration() -> Registration {
    Registration {
        name: "push",
        usage: "push REMOTE-1,REMOTE-2,...,REMOTE-N [REF]",
        long: "Push REF to each of REMOTE-1 through REMOTE-N by executing multiple\n\
               git-push(1) commands.",
        git_extension: true,
        transformer: Box::new(PushCommand),
    }
}

impl Transform for PushCommand {
    fn transform(&self, args: &mut Args, _ctx: &Context) -> Result<()> {
        let Some(index) = args.params().iter().position(|p| !p.starts_with('-')) else {
            return Ok(());
        };
        let word = args.params()[index].clone();
        let remotes: Vec<&str> = word.split(',').filter(|r| !r.is_empty()).collect();
        let [first, rest @ ..] = remotes.as_slice() else {
            return Ok(());
        };
        if rest.is_empty() {
            return Ok(());
        }

        args.replace_param(index, *first)?;
        for remote in rest {
            let mut params: Vec<String> = args.global_flags.clone();
            params.push("push".to_string());
            params.extend(args.params().iter().cloned());
            params[args.global_flags.len() + 1 + index] = remote.to_string();
            args.after("git", params);
        }

        Ok(())
    }
}
