//! The launch sequence: build shared, start backend, build frontend, start
//! frontend, open the browser. Strictly sequential; the first failing step
//! ends the run and nothing after it is attempted.

use anyhow::Result;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::browser::BrowserOpener;
use crate::config::{LauncherConfig, ReadinessConfig, ReadinessMode};
use crate::console::{Console, Pause, EXIT_PROMPT};
use crate::exec::{self, CommandRunner, Mode, ShellCommand};
use crate::readiness::{self, Clock, Probe, Readiness, Wait};
use crate::template::TemplateEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepId {
    SharedBuild,
    BackendStart,
    FrontendBuild,
    FrontendStart,
}

impl StepId {
    pub fn title(self) -> &'static str {
        match self {
            StepId::SharedBuild => "Building shared package",
            StepId::BackendStart => "Starting Backend Server",
            StepId::FrontendBuild => "Building Frontend",
            StepId::FrontendStart => "Starting Frontend Server",
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            StepId::SharedBuild => "Shared package built successfully",
            StepId::BackendStart => "Backend server starting...",
            StepId::FrontendBuild => "Frontend built successfully",
            StepId::FrontendStart => "Frontend server starting...",
        }
    }

    pub fn failure_message(self) -> &'static str {
        match self {
            StepId::SharedBuild => "Failed to build shared package",
            StepId::BackendStart => "Failed to start backend server",
            StepId::FrontendBuild => "Failed to build frontend",
            StepId::FrontendStart => "Failed to start frontend server",
        }
    }

    /// Service name used in readiness messages.
    fn service(self) -> &'static str {
        match self {
            StepId::SharedBuild => "Shared package",
            StepId::BackendStart => "Backend",
            StepId::FrontendBuild | StepId::FrontendStart => "Frontend",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub id: StepId,
    pub command: ShellCommand,
    pub mode: Mode,
    /// Applied after a successful background launch.
    pub settle: Option<Wait>,
}

#[derive(Debug, Clone)]
pub struct LaunchPlan {
    pub config: LauncherConfig,
    pub steps: Vec<Step>,
}

impl LaunchPlan {
    /// Lay out the four steps with package directories resolved against `root`.
    pub fn new(config: LauncherConfig, root: &Path) -> Self {
        let shared_dir = root.join(&config.shared.dir);
        let backend_dir = root.join(&config.backend.dir);
        let frontend_dir = root.join(&config.frontend.dir);

        let steps = vec![
            Step {
                id: StepId::SharedBuild,
                command: ShellCommand::new(config.shared.build.clone(), shared_dir),
                mode: Mode::Foreground,
                settle: None,
            },
            Step {
                id: StepId::BackendStart,
                command: ShellCommand::new(config.backend.command.clone(), backend_dir),
                mode: Mode::Background,
                settle: Some(settle_for(
                    &config.readiness,
                    config.backend.start_delay_secs,
                    config.backend.health_url(),
                )),
            },
            Step {
                id: StepId::FrontendBuild,
                command: ShellCommand::new(config.frontend.build.clone(), frontend_dir.clone()),
                mode: Mode::Foreground,
                settle: None,
            },
            Step {
                id: StepId::FrontendStart,
                command: ShellCommand::new(config.frontend.command.clone(), frontend_dir),
                mode: Mode::Background,
                settle: Some(settle_for(
                    &config.readiness,
                    config.frontend.start_delay_secs,
                    config.frontend.url.clone(),
                )),
            },
        ];

        Self { config, steps }
    }
}

fn settle_for(readiness: &ReadinessConfig, delay_secs: u64, url: String) -> Wait {
    match readiness.mode {
        ReadinessMode::Fixed => Wait::Fixed(Duration::from_secs(delay_secs)),
        ReadinessMode::Poll => Wait::Poll {
            url,
            interval: readiness.interval(),
            timeout: readiness.timeout(),
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every step succeeded and the browser step was reached.
    Started,
    Failed { step: StepId },
}

impl Outcome {
    pub fn exit_code(self) -> u8 {
        match self {
            Outcome::Started => 0,
            Outcome::Failed { .. } => 1,
        }
    }
}

/// Everything the launch sequence touches outside its own memory.
pub struct Hooks<'a> {
    pub runner: &'a mut dyn CommandRunner,
    pub browser: &'a mut dyn BrowserOpener,
    pub clock: &'a mut dyn Clock,
    pub probe: &'a mut dyn Probe,
    pub pause: &'a mut dyn Pause,
    pub out: &'a mut dyn Write,
}

/// Run the plan. Step failures are reported on the console and returned as
/// [`Outcome::Failed`]; `Err` only means the console templates could not be
/// rendered, which is checked before any command runs.
pub fn launch(plan: &LaunchPlan, hooks: Hooks<'_>) -> Result<Outcome> {
    let Hooks {
        runner,
        browser,
        clock,
        probe,
        pause,
        out,
    } = hooks;
    let config = &plan.config;

    let engine = TemplateEngine::new()?;
    let banner = engine.banner(config)?;
    let summary = engine.summary(config)?;

    let mut console = Console::new(out);
    console.banner(&config.project.name);

    let total = plan.steps.len();
    for (index, step) in plan.steps.iter().enumerate() {
        console.step(index + 1, total, step.id.title());

        if !exec::execute(runner, &mut console, &step.command, step.mode) {
            console.fail(step.id.failure_message());
            if config.console.pause_on_exit {
                pause.wait(EXIT_PROMPT);
            }
            return Ok(Outcome::Failed { step: step.id });
        }
        console.ok(step.id.success_message());

        if let Some(strategy) = &step.settle {
            settle(&mut console, clock, probe, step.id, strategy);
        }
    }

    console.blank();
    console.raw(&banner);

    let url = config.frontend.url.as_str();
    if config.browser.open {
        clock.sleep(Duration::from_secs(config.browser.delay_secs));
        console.blank();
        match browser.open(url) {
            Ok(()) => console.ok("Browser opened successfully!"),
            Err(e) => {
                console.warn(&format!("Could not open browser automatically: {:#}", e));
                console.info(&format!("Please manually open: {}", url));
            }
        }
    } else {
        console.blank();
        console.info(&format!("Please manually open: {}", url));
    }

    console.raw(&summary);

    if config.console.pause_on_exit {
        console.blank();
        pause.wait(EXIT_PROMPT);
    }
    Ok(Outcome::Started)
}

fn settle(
    console: &mut Console<'_>,
    clock: &mut dyn Clock,
    probe: &mut dyn Probe,
    step: StepId,
    strategy: &Wait,
) {
    if let Wait::Poll { url, timeout, .. } = strategy {
        console.info(&format!(
            "⏳ Waiting for {} at {} (up to {}s)...",
            step.service(),
            url,
            timeout.as_secs()
        ));
    }

    match readiness::wait(strategy, clock, probe) {
        Readiness::Assumed => {}
        Readiness::Ready { attempts } => {
            console.ok(&format!("{} is ready", step.service()));
            console.detail(&format!("answered after {} attempt(s)", attempts));
        }
        Readiness::TimedOut { .. } => {
            let secs = match strategy {
                Wait::Poll { timeout, .. } => timeout.as_secs(),
                Wait::Fixed(delay) => delay.as_secs(),
            };
            console.warn(&format!(
                "{} did not respond within {}s; continuing",
                step.service(),
                secs
            ));
        }
    }
}
