//! Console output for the launcher, using the `colored` crate.
//!
//! Everything goes through an injected writer so the launch sequence can be
//! driven against a buffer. Write errors are dropped: a console that cannot
//! be written to must not abort a launch.

use colored::Colorize;
use std::fmt::Display;
use std::io::Write;

/// Width of the `=` rule around banners.
pub const RULE_WIDTH: usize = 55;

pub fn rule() -> String {
    "=".repeat(RULE_WIDTH)
}

pub struct Console<'a> {
    out: &'a mut dyn Write,
}

impl<'a> Console<'a> {
    pub fn new(out: &'a mut dyn Write) -> Self {
        Self { out }
    }

    fn line(&mut self, text: impl Display) {
        let _ = writeln!(self.out, "{}", text);
    }

    pub fn blank(&mut self) {
        self.line("");
    }

    /// Write pre-rendered text as-is.
    pub fn raw(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
    }

    /// Opening banner: rule, centred title, rule, "Starting servers".
    pub fn banner(&mut self, title: &str) {
        self.blank();
        self.line(rule().bold());
        self.line(format!("{:^width$}", title, width = RULE_WIDTH).trim_end().bold());
        self.line(rule().bold());
        self.blank();
        self.line("🚀 Starting servers... Please wait...");
        self.blank();
    }

    /// `[n/total] title...`; every step after the first is preceded by a blank line.
    pub fn step(&mut self, number: usize, total: usize, title: &str) {
        if number > 1 {
            self.blank();
        }
        self.line(format!("[{}/{}] {}...", number, total, title).bold());
        let _ = self.out.flush();
    }

    pub fn ok(&mut self, message: &str) {
        self.line(format!("✅ {}", message).green());
    }

    pub fn fail(&mut self, message: &str) {
        self.line(format!("❌ {}", message).red());
    }

    pub fn warn(&mut self, message: &str) {
        self.line(format!("⚠️  {}", message).yellow());
    }

    pub fn info(&mut self, message: &str) {
        self.line(message);
    }

    pub fn detail(&mut self, message: &str) {
        self.line(format!("   {}", message).dimmed());
    }

    /// A foreground command ran and exited nonzero.
    pub fn command_failed(&mut self, command: &str, stderr: &str) {
        self.fail(&format!("Error running command: {}", command));
        self.line(format!("Error: {}", stderr.trim_end()));
    }

    /// A command could not be launched at all.
    pub fn command_exception(&mut self, command: &str, error: &anyhow::Error) {
        self.fail(&format!("Exception running command: {}", command));
        self.line(format!("Exception: {:#}", error));
    }
}

pub const EXIT_PROMPT: &str = "Press Enter to exit...";

/// Blocks until the user acknowledges, so a double-clicked launcher window
/// stays open long enough to be read.
pub trait Pause {
    fn wait(&mut self, prompt: &str);
}

/// Prompts on the terminal with `dialoguer`.
#[derive(Debug, Default)]
pub struct DialoguerPause;

impl Pause for DialoguerPause {
    fn wait(&mut self, prompt: &str) {
        // No terminal (piped, CI): nothing to wait for.
        let _ = dialoguer::Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .report(false)
            .interact_text();
    }
}
