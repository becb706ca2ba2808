// src/instructions.rs

//! Instruction model: how to build, run and watch a single function.
//!
//! These are plain values produced by the runtime handlers and consumed by
//! the build driver, the process supervisor and the watcher. Nothing here
//! performs I/O.

use std::collections::BTreeMap;

/// A single external command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub executable: String,
    pub args: Vec<String>,
    /// Overrides applied on top of the inherited process environment.
    pub env: BTreeMap<String, String>,
}

impl Command {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Merge this command's overrides over `inherited`.
    ///
    /// Overrides always win for keys present in both.
    pub fn merged_env<'a, I>(&self, inherited: I) -> BTreeMap<String, String>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        let mut merged: BTreeMap<String, String> = inherited
            .into_iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        for (k, v) in &self.env {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}

/// Include/exclude glob patterns for a function's sources.
///
/// Include patterns are always absolute.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchSpec {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Resolved build/run/watch description for one function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSet {
    /// `None` means the function runs straight from source.
    pub build: Option<Command>,
    pub run: Command,
    pub watch: WatchSpec,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_wins_over_inherited() {
        let cmd = Command::new("node").env("K", "v1");
        let inherited: BTreeMap<String, String> = [
            ("K".to_string(), "v2".to_string()),
            ("HOME".to_string(), "/home/dev".to_string()),
        ]
        .into_iter()
        .collect();

        let merged = cmd.merged_env(&inherited);

        assert_eq!(merged.get("K").map(String::as_str), Some("v1"));
        assert_eq!(merged.get("HOME").map(String::as_str), Some("/home/dev"));
    }

    #[test]
    fn builder_keeps_argument_order() {
        let cmd = Command::new("go")
            .arg("build")
            .args(["-o", "out"])
            .arg("main.go");
        assert_eq!(cmd.args, vec!["build", "-o", "out", "main.go"]);
    }
}
