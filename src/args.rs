//! The mutable command model every transformer works on
//!
//! An [`Args`] is one git invocation (global flags, subcommand and params)
//! plus commands queued to run before and after it. The final sequence is
//! always `before...`, the primary command unless suppressed, `after...`.

use crate::cmd::Cmd;
use crate::error::GhError;

/// Global git options that take their value as the next token
const GLOBAL_FLAGS_WITH_VALUE: [&str; 5] = ["-C", "-c", "--git-dir", "--work-tree", "--namespace"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    pub executable: String,
    pub global_flags: Vec<String>,
    pub command: String,
    params: Vec<String>,
    before: Vec<Cmd>,
    after: Vec<Cmd>,
    no_forward: bool,
    noop: bool,
}

impl Args {
    /// Build from the arguments that follow the program name
    pub fn new<S: AsRef<str>>(raw: &[S]) -> Self {
        let mut global_flags = Vec::new();
        let mut noop = false;
        let mut iter = raw.iter().map(|s| s.as_ref().to_string());
        let mut command = String::new();

        while let Some(token) = iter.next() {
            if token == "--noop" {
                noop = true;
            } else if token.starts_with('-') {
                let takes_value = GLOBAL_FLAGS_WITH_VALUE.contains(&token.as_str());
                global_flags.push(token);
                if takes_value && let Some(value) = iter.next() {
                    global_flags.push(value);
                }
            } else {
                command = token;
                break;
            }
        }

        let mut args = Self {
            executable: "git".to_string(),
            global_flags,
            command,
            params: iter.collect(),
            before: Vec::new(),
            after: Vec::new(),
            no_forward: false,
            noop: false,
        };
        if noop {
            args.noop();
        }
        args
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn params_len(&self) -> usize {
        self.params.len()
    }

    pub fn is_params_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn first_param(&self) -> Option<&str> {
        self.params.first().map(String::as_str)
    }

    pub fn last_param(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Params that are not flags, in order
    pub fn words(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| !p.starts_with('-'))
            .cloned()
            .collect()
    }

    /// Index of the first param equal to `token`
    pub fn index_of_param(&self, token: &str) -> Option<usize> {
        self.params.iter().position(|p| p == token)
    }

    pub fn has_flag(&self, names: &[&str]) -> bool {
        self.params.iter().any(|p| names.contains(&p.as_str()))
    }

    fn check_index(&self, index: usize, len: usize) -> Result<(), GhError> {
        if index >= len {
            return Err(GhError::IndexOutOfRange {
                index,
                len: self.params.len(),
            });
        }
        Ok(())
    }

    pub fn replace_param(&mut self, index: usize, token: impl Into<String>) -> Result<(), GhError> {
        self.check_index(index, self.params.len())?;
        self.params[index] = token.into();
        Ok(())
    }

    pub fn remove_param(&mut self, index: usize) -> Result<String, GhError> {
        self.check_index(index, self.params.len())?;
        Ok(self.params.remove(index))
    }

    /// Insert tokens at `index`; `index == len` appends
    pub fn insert_param<I, S>(&mut self, index: usize, tokens: I) -> Result<(), GhError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.check_index(index, self.params.len() + 1)?;
        let tail = self.params.split_off(index);
        self.params.extend(tokens.into_iter().map(Into::into));
        self.params.extend(tail);
        Ok(())
    }

    pub fn append_params<I, S>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params.extend(tokens.into_iter().map(Into::into));
    }

    /// Remove every occurrence of a boolean flag; true if one was present
    pub fn take_flag(&mut self, names: &[&str]) -> bool {
        let before = self.params.len();
        self.params.retain(|p| !names.contains(&p.as_str()));
        self.params.len() != before
    }

    /// Remove a flag and its value (`-m value`, `--message=value`)
    ///
    /// The last occurrence wins. A trailing flag with no value is removed and
    /// yields an empty string.
    pub fn take_flag_value(&mut self, names: &[&str]) -> Option<String> {
        let mut value = None;
        let mut i = 0;
        while i < self.params.len() {
            let param = &self.params[i];
            if names.contains(&param.as_str()) {
                self.params.remove(i);
                value = Some(if i < self.params.len() {
                    self.params.remove(i)
                } else {
                    String::new()
                });
                continue;
            }
            let inline = names.iter().find_map(|name| {
                param
                    .strip_prefix(name)
                    .and_then(|rest| rest.strip_prefix('='))
                    .filter(|_| name.starts_with("--"))
                    .map(str::to_string)
            });
            if let Some(v) = inline {
                self.params.remove(i);
                value = Some(v);
                continue;
            }
            i += 1;
        }
        value
    }

    /// Queue a command to run before the primary one
    pub fn before<I, S>(&mut self, executable: &str, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.before.push(Cmd::with_args(executable, args));
    }

    /// Queue a command to run after the primary one
    pub fn after<I, S>(&mut self, executable: &str, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.after.push(Cmd::with_args(executable, args));
    }

    /// Swap out the primary command; git global flags survive only for git
    pub fn replace<I, S>(&mut self, executable: &str, command: &str, params: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if executable != self.executable || executable != "git" {
            self.global_flags.clear();
        }
        self.executable = executable.to_string();
        self.command = command.to_string();
        self.params = params.into_iter().map(Into::into).collect();
    }

    pub fn no_forward(&mut self) {
        self.no_forward = true;
    }

    pub fn is_no_forward(&self) -> bool {
        self.no_forward
    }

    pub fn noop(&mut self) {
        self.noop = true;
    }

    pub fn is_noop(&self) -> bool {
        self.noop
    }

    /// The primary command as it would run
    pub fn to_cmd(&self) -> Cmd {
        let mut cmd = Cmd::with_args(&self.executable, self.global_flags.iter().cloned());
        if !self.command.is_empty() {
            cmd.args.push(self.command.clone());
        }
        cmd.args.extend(self.params.iter().cloned());
        cmd
    }

    /// `before...`, primary unless suppressed, `after...`
    pub fn commands(&self) -> Vec<Cmd> {
        let mut cmds = self.before.clone();
        if !self.no_forward {
            cmds.push(self.to_cmd());
        }
        cmds.extend(self.after.iter().cloned());
        cmds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &str) -> Args {
        Args::new(&raw.split_whitespace().collect::<Vec<_>>())
    }

    #[test]
    fn test_new_splits_command_and_params() {
        let a = args("clone -p jingweno/gh dir");
        assert_eq!(a.executable, "git");
        assert_eq!(a.command, "clone");
        assert_eq!(a.params(), ["-p", "jingweno/gh", "dir"]);
        assert!(!a.is_noop());
    }

    #[test]
    fn test_new_global_flags_and_noop() {
        let a = args("--noop -C /tmp/repo -c core.pager=cat --bare fetch origin");
        assert!(a.is_noop());
        assert_eq!(a.global_flags, ["-C", "/tmp/repo", "-c", "core.pager=cat", "--bare"]);
        assert_eq!(a.command, "fetch");
        assert_eq!(a.params(), ["origin"]);
        assert_eq!(
            a.to_cmd().to_string(),
            "git -C /tmp/repo -c core.pager=cat --bare fetch origin"
        );
    }

    #[test]
    fn test_new_without_command() {
        let a = args("--version");
        assert_eq!(a.command, "");
        assert_eq!(a.to_cmd().to_string(), "git --version");
        assert_eq!(Args::new::<&str>(&[]).to_cmd().to_string(), "git");
    }

    #[test]
    fn test_words_skip_flags_and_are_repeatable() {
        let a = args("merge --no-ff https://github.com/a/b/pull/1 -q master");
        assert_eq!(a.words(), ["https://github.com/a/b/pull/1", "master"]);
        assert_eq!(a.words(), a.words());
    }

    #[test]
    fn test_index_of_param_first_match() {
        let a = args("fetch origin origin");
        assert_eq!(a.index_of_param("origin"), Some(0));
        assert_eq!(a.index_of_param("upstream"), None);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut a = args("checkout a b c");
        a.replace_param(1, "B").unwrap();
        assert_eq!(a.params(), ["a", "B", "c"]);
        assert_eq!(a.remove_param(0).unwrap(), "a");
        assert_eq!(a.params(), ["B", "c"]);
    }

    #[test]
    fn test_out_of_range() {
        let mut a = args("checkout a b");
        assert_eq!(
            a.replace_param(2, "x"),
            Err(GhError::IndexOutOfRange { index: 2, len: 2 })
        );
        assert_eq!(
            a.remove_param(5),
            Err(GhError::IndexOutOfRange { index: 5, len: 2 })
        );
        assert_eq!(
            a.insert_param(3, ["x"]),
            Err(GhError::IndexOutOfRange { index: 3, len: 2 })
        );
        assert_eq!(a.params(), ["a", "b"]);
    }

    #[test]
    fn test_insert_preserves_order() {
        let mut a = args("fetch a d");
        a.insert_param(1, ["b", "c"]).unwrap();
        assert_eq!(a.params(), ["a", "b", "c", "d"]);
        a.insert_param(4, ["e"]).unwrap();
        assert_eq!(a.params(), ["a", "b", "c", "d", "e"]);
        a.insert_param(0, ["_"]).unwrap();
        assert_eq!(a.params(), ["_", "a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_insert_then_remove_round_trip() {
        let original = args("push origin master --force -u");
        for index in 0..=original.params_len() {
            let mut a = original.clone();
            a.insert_param(index, ["token"]).unwrap();
            assert_eq!(a.remove_param(index).unwrap(), "token");
            assert_eq!(a.params(), original.params(), "index {}", index);
        }
    }

    #[test]
    fn test_take_flag() {
        let mut a = args("clone -p jingweno/gh -p");
        assert!(a.take_flag(&["-p"]));
        assert_eq!(a.params(), ["jingweno/gh"]);
        assert!(!a.take_flag(&["-p"]));
    }

    #[test]
    fn test_take_flag_value() {
        let mut a = args("pull-request -b master --message=hello -h me:topic");
        assert_eq!(a.take_flag_value(&["-b", "--base"]), Some("master".to_string()));
        assert_eq!(a.take_flag_value(&["-m", "--message"]), Some("hello".to_string()));
        assert_eq!(a.take_flag_value(&["-h", "--head"]), Some("me:topic".to_string()));
        assert!(a.is_params_empty());

        let mut a = args("create -d");
        assert_eq!(a.take_flag_value(&["-d"]), Some(String::new()));
        assert_eq!(a.take_flag_value(&["-d"]), None);
    }

    #[test]
    fn test_linearization() {
        let mut a = args("fetch mislav");
        a.after("git", ["log", "-1"]);
        a.before("git", ["remote", "add", "mislav", "url"]);
        a.before("echo", ["second"]);

        let lines: Vec<String> = a.commands().iter().map(|c| c.to_string()).collect();
        assert_eq!(
            lines,
            [
                "git remote add mislav url",
                "echo second",
                "git fetch mislav",
                "git log -1",
            ]
        );

        a.no_forward();
        assert_eq!(a.commands().len(), 3);
        assert!(a.commands().iter().all(|c| c.args.first().map(String::as_str) != Some("fetch")));
    }

    #[test]
    fn test_replace_primary() {
        let mut a = args("-C dir sync");
        a.replace("git", "fetch", ["--prune", "origin"]);
        assert_eq!(a.to_cmd().to_string(), "git -C dir fetch --prune origin");

        a.replace("echo", "", ["done"]);
        assert_eq!(a.to_cmd().to_string(), "echo done");
    }
}
