use anyhow::Result;
use lms_start_core::browser::SystemBrowser;
use lms_start_core::console::{Console, DialoguerPause, Pause, EXIT_PROMPT};
use lms_start_core::exec::SystemRunner;
use lms_start_core::launcher::{self, Hooks, LaunchPlan};
use lms_start_core::readiness::{HttpProbe, SystemClock};
use std::io::Write;
use std::process::ExitCode;

use super::GlobalArgs;

pub fn run(global: &GlobalArgs) -> Result<ExitCode> {
    let mut stdout = std::io::stdout();
    match launch(global, &mut stdout) {
        Ok(code) => Ok(code),
        Err(e) => Ok(report_error(&e, !global.no_pause, &mut DialoguerPause, &mut stdout)),
    }
}

fn launch(global: &GlobalArgs, out: &mut dyn Write) -> Result<ExitCode> {
    let (root, config) = global.load()?;
    let plan = LaunchPlan::new(config, &root);

    let outcome = launcher::launch(
        &plan,
        Hooks {
            runner: &mut SystemRunner,
            browser: &mut SystemBrowser,
            clock: &mut SystemClock,
            probe: &mut HttpProbe::new()?,
            pause: &mut DialoguerPause,
            out,
        },
    )?;

    Ok(ExitCode::from(outcome.exit_code()))
}

/// Errors raised before the first step (root, config, templates) still get
/// the exit prompt, so a double-clicked window stays open on them.
fn report_error(
    err: &anyhow::Error,
    pause_on_exit: bool,
    pause: &mut dyn Pause,
    out: &mut dyn Write,
) -> ExitCode {
    let mut console = Console::new(out);
    console.fail(&format!("{:#}", err));
    if pause_on_exit {
        console.blank();
        pause.wait(EXIT_PROMPT);
    }
    ExitCode::FAILURE
}
