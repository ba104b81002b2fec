//! `gh version` reports the gh version after git's own

use anyhow::Result;

use super::{Context, Registration, Transform};
use crate::args::Args;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct VersionCommand;

pub fn registration() -> Registration {
    Registration {
        name: "version",
        usage: "version",
        long: "Shows git version and gh client version.",
        git_extension: true,
        transformer: Box::new(VersionCommand),
    }
}

impl Transform for VersionCommand {
    fn transform(&self, args: &mut Args, _ctx: &Context) -> Result<()> {
        args.after("echo", [format!("gh version {}", VERSION)]);
        Ok(())
    }
}
