//! Concrete commands and the process runner that executes them

use anyhow::{Context, Result};
use std::fmt;
use std::process::{Command, ExitStatus, Stdio};

/// A fully formed command: executable plus its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cmd {
    pub name: String,
    pub args: Vec<String>,
}

impl Cmd {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Quote a token for a POSIX shell, leaving common safe tokens bare
fn sh_quote(s: &str) -> String {
    if !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:@%+,=~".contains(c))
    {
        return s.to_string();
    }

    let mut out = String::from("'");
    for ch in s.chars() {
        if ch == '\'' {
            out.push_str("'\\''");
        } else {
            out.push(ch);
        }
    }
    out.push('\'');
    out
}

impl fmt::Display for Cmd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", sh_quote(&self.name))?;
        for arg in &self.args {
            write!(f, " {}", sh_quote(arg))?;
        }
        Ok(())
    }
}

/// Process execution collaborator
pub trait Runner {
    /// Run with inherited stdio and return the exit code
    fn spawn(&self, cmd: &Cmd) -> Result<i32>;

    /// Run capturing stdout; stderr is discarded
    fn spawn_capture(&self, cmd: &Cmd) -> Result<(String, i32)>;
}

/// Exit code as a shell reports it: 128 plus the signal for killed children
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

/// Runs commands as real subprocesses
#[derive(Debug, Default)]
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn spawn(&self, cmd: &Cmd) -> Result<i32> {
        tracing::debug!(command = %cmd, "spawning");
        let status = Command::new(&cmd.name)
            .args(&cmd.args)
            .status()
            .with_context(|| format!("Failed to run {}", cmd.name))?;

        Ok(exit_code(status))
    }

    fn spawn_capture(&self, cmd: &Cmd) -> Result<(String, i32)> {
        let output = Command::new(&cmd.name)
            .args(&cmd.args)
            .stderr(Stdio::null())
            .output()
            .with_context(|| format!("Failed to run {}", cmd.name))?;

        Ok((
            String::from_utf8_lossy(&output.stdout).to_string(),
            exit_code(output.status),
        ))
    }
}
