//! Foreground and background execution of shell command lines.

use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::console::Console;

/// A command line and the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    pub line: String,
    pub cwd: PathBuf,
}

impl ShellCommand {
    pub fn new(line: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            line: line.into(),
            cwd: cwd.into(),
        }
    }

    /// Build the platform shell invocation (`cmd /C` on Windows, `sh -c` elsewhere).
    pub fn to_command(&self) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.arg("/C").arg(&self.line);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.arg("-c").arg(&self.line);
            cmd
        };
        cmd.current_dir(&self.cwd);
        cmd
    }
}

impl fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.line)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Wait for exit and capture output.
    Foreground,
    /// Spawn detached and move on.
    Background,
}

/// Result of a foreground command that ran to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl Completion {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A launched background process. Nothing waits on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawned {
    pub pid: u32,
}

/// Process-launch seam. `Err` from either method means the process could not
/// be started at all (missing shell, missing working directory, ...).
pub trait CommandRunner {
    fn run(&mut self, cmd: &ShellCommand) -> Result<Completion>;
    fn spawn(&mut self, cmd: &ShellCommand) -> Result<Spawned>;
}

/// Runs commands through the operating system.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&mut self, cmd: &ShellCommand) -> Result<Completion> {
        ensure_dir(&cmd.cwd)?;
        let output = cmd
            .to_command()
            .stdin(Stdio::null())
            .output()
            .with_context(|| format!("Failed to execute '{}'", cmd.line))?;
        Ok(Completion {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn spawn(&mut self, cmd: &ShellCommand) -> Result<Spawned> {
        ensure_dir(&cmd.cwd)?;
        let mut command = cmd.to_command();
        // stdin stays with the launcher so its exit prompt keeps the keyboard.
        command.stdin(Stdio::null());
        detach(&mut command);
        let child = command
            .spawn()
            .with_context(|| format!("Failed to start '{}'", cmd.line))?;
        // Dropping `Child` neither kills nor waits on the process.
        Ok(Spawned { pid: child.id() })
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        anyhow::bail!("Working directory not found: {}", dir.display());
    }
    Ok(())
}

#[cfg(windows)]
fn detach(command: &mut Command) {
    use std::os::windows::process::CommandExt;
    const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;
    command.creation_flags(CREATE_NEW_CONSOLE);
}

/// Own process group, so a Ctrl+C at the launcher's exit prompt does not
/// reach the servers.
#[cfg(unix)]
fn detach(command: &mut Command) {
    use std::os::unix::process::CommandExt;
    command.process_group(0);
}

#[cfg(not(any(unix, windows)))]
fn detach(_command: &mut Command) {}

/// Run `cmd` in the given mode and report failures to the console.
///
/// Returns `true` when a foreground command exited 0 or a background command
/// was launched. A launch error and a nonzero exit both return `false`.
pub fn execute(
    runner: &mut dyn CommandRunner,
    console: &mut Console<'_>,
    cmd: &ShellCommand,
    mode: Mode,
) -> bool {
    match mode {
        Mode::Foreground => match runner.run(cmd) {
            Ok(completion) if completion.success() => true,
            Ok(completion) => {
                console.command_failed(&cmd.line, &completion.stderr);
                false
            }
            Err(e) => {
                console.command_exception(&cmd.line, &e);
                false
            }
        },
        Mode::Background => match runner.spawn(cmd) {
            Ok(spawned) => {
                console.detail(&format!("pid {} ({})", spawned.pid, cmd.cwd.display()));
                true
            }
            Err(e) => {
                console.command_exception(&cmd.line, &e);
                false
            }
        },
    }
}
