use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// A fully resolved external command: program, arguments and working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>, cwd: &Path) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: cwd.to_path_buf(),
        }
    }

    pub fn render(&self) -> String {
        let mut parts = Vec::with_capacity(self.args.len() + 1);
        parts.push(quote_for_display(&self.program.to_string_lossy()));
        for arg in &self.args {
            parts.push(quote_for_display(arg));
        }
        parts.join(" ")
    }
}

/// Exit state of a finished external process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOutcome {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl ProcessOutcome {
    pub fn success() -> Self {
        Self { code: Some(0) }
    }

    pub fn is_success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn describe(&self) -> String {
        match self.code {
            Some(code) => format!("exit code {code}"),
            None => "terminated by signal".to_string(),
        }
    }
}

/// Runs external commands. `Err` means the process could not be spawned at all.
pub trait ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutcome>;
}

/// Spawns the command and blocks until it exits, sharing the terminal.
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutcome> {
        log::debug!(
            "spawning `{}` in {}",
            invocation.render(),
            invocation.cwd.display()
        );
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .with_context(|| format!("running `{}`", invocation.render()))?;

        Ok(ProcessOutcome {
            code: status.code(),
        })
    }
}

/// Prints the resolved command instead of executing it.
pub struct DryRunRunner;

impl ProcessRunner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutcome> {
        println!(
            "[dry-run] {} (in {})",
            invocation.render(),
            invocation.cwd.display()
        );
        Ok(ProcessOutcome::success())
    }
}

/// Run `program args...` in `cwd` with output captured; used for version and package queries, never for setup steps.
pub fn capture(program: &str, args: &[&str], cwd: &Path) -> std::io::Result<std::process::Output> {
    Command::new(program)
        .args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
}

/// Split "py -3" into ("py", ["-3"])
pub fn split_first(cmd: &str) -> (&str, Vec<&str>) {
    let mut parts = cmd.split_whitespace();
    let bin = parts.next().unwrap_or(cmd);
    let rest: Vec<&str> = parts.collect();
    (bin, rest)
}

fn quote_for_display(input: &str) -> String {
    if input.is_empty() {
        return "\"\"".to_string();
    }

    if input.chars().all(|c| {
        c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '\\' | ':' | '@' | '=')
    }) {
        return input.to_string();
    }

    format!("\"{}\"", input.replace('\\', "\\\\").replace('"', "\\\""))
}
