mod args;
mod cmd;
mod commands;
mod error;
mod git;
mod github;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cmd::SystemRunner;
use crate::commands::{Environment, ExitResult, Registry, register_all};
use crate::git::GitCli;
use crate::github::config::Config;
use crate::github::rest::RestClient;
use crate::github::ssh_config::SshConfig;
use crate::github::url::UrlParser;

#[derive(Parser)]
#[command(name = "gh")]
#[command(about = "git wrapper with GitHub shorthand", long_about = None)]
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Git command and arguments
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false),
        )
        .init();
}

fn report(err: &anyhow::Error) {
    let label = if std::io::stderr().is_terminal() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    };
    eprintln!("{} {:#}", label, err);
}

fn dispatch(args: &[String]) -> Result<ExitResult> {
    let config = Config::load();
    let parser = UrlParser::from_config(&config, SshConfig::load());
    let api = RestClient::new(config.clone())?;
    let runner = SystemRunner;
    let git = GitCli::new(&runner);

    let mut registry = Registry::new();
    register_all(&mut registry);

    let env = Environment {
        runner: &runner,
        git: &git,
        api: &api,
        config: &config,
        parser: &parser,
    };
    Ok(commands::run(args, &registry, &env))
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let exit_code = match dispatch(&cli.args) {
        Ok(result) => {
            if let Some(err) = &result.error {
                report(err);
            }
            result.exit_code
        }
        Err(err) => {
            report(&err);
            1
        }
    };

    std::process::exit(exit_code);
}
