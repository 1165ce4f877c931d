pub mod config;
pub mod doctor;
pub mod init;
pub mod start;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use lms_start_core::config::{ConfigSources, LauncherConfig, Overrides, ReadinessMode};
use lms_start_core::project;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(
    name = "lms-start",
    version,
    about = "Build and start the RME LMS (shared, backend, frontend) and open it in the browser"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    /// Defaults to `start`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Project root holding the shared, backend and frontend packages
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
    /// Config file to use instead of <root>/lms.toml
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Backend base URL
    #[arg(long, global = true)]
    pub backend_url: Option<String>,
    /// Frontend base URL, opened in the browser
    #[arg(long, global = true)]
    pub frontend_url: Option<String>,
    /// How to wait for a launched server: fixed or poll
    #[arg(long, global = true)]
    pub readiness: Option<ReadinessMode>,
    /// Do not open the browser
    #[arg(long, global = true)]
    pub no_browser: bool,
    /// Exit without waiting for Enter
    #[arg(long, global = true)]
    pub no_pause: bool,
}

impl GlobalArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            backend_url: self.backend_url.clone(),
            frontend_url: self.frontend_url.clone(),
            readiness: self.readiness,
            no_browser: self.no_browser,
            no_pause: self.no_pause,
        }
    }

    pub fn sources(&self, root: &std::path::Path) -> ConfigSources {
        ConfigSources::discover(root, self.config.as_deref())
    }

    /// Resolve the project root and the fully layered, validated config.
    pub fn load(&self) -> Result<(PathBuf, LauncherConfig)> {
        let root = project::resolve_root(self.root.as_deref())?;
        let mut config = LauncherConfig::load_layered(&self.sources(&root))?;
        config.apply(&self.overrides());
        config.validate()?;
        Ok((root, config))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the packages, start both servers and open the browser
    Start,
    /// Write a default lms.toml into the project root
    Init {
        /// Overwrite an existing lms.toml without asking
        #[arg(long)]
        force: bool,
    },
    /// Check project layout, package scripts and tools
    Doctor,
    /// Print the resolved configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: clap_complete::Shell,
    },
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command.unwrap_or(Commands::Start) {
        Commands::Start => start::run(&cli.global),
        Commands::Init { force } => init::run(&cli.global, force).map(|_| ExitCode::SUCCESS),
        Commands::Doctor => doctor::run(&cli.global).map(|_| ExitCode::SUCCESS),
        Commands::Config => config::run(&cli.global).map(|_| ExitCode::SUCCESS),
        Commands::Completions { shell } => {
            use clap::CommandFactory;
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "lms-start", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}
