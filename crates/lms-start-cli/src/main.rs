mod commands;

use anyhow::Result;
use clap::Parser;
use commands::Cli;
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    commands::run(cli)
}
