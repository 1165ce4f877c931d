use anyhow::{bail, Context, Result};
use std::process::{Command, Stdio};

pub trait BrowserOpener {
    fn open(&mut self, url: &str) -> Result<()>;
}

/// Opens the host's default browser through the platform URL handler.
#[derive(Debug, Default)]
pub struct SystemBrowser;

impl SystemBrowser {
    fn command(url: &str) -> Command {
        let mut cmd = if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            // The empty string is `start`'s window title argument.
            cmd.args(["/C", "start", ""]).arg(url);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

impl BrowserOpener for SystemBrowser {
    fn open(&mut self, url: &str) -> Result<()> {
        let mut cmd = Self::command(url);
        let program = cmd.get_program().to_string_lossy().into_owned();
        let status = cmd
            .status()
            .with_context(|| format!("{} could not be started", program))?;
        if !status.success() {
            bail!(
                "{} exited with code {}",
                program,
                status.code().unwrap_or(-1)
            );
        }
        Ok(())
    }
}
