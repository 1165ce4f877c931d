use anyhow::Result;
use colored::Colorize;
use lms_start_core::config::LauncherConfig;
use lms_start_core::project;
use lms_start_core::readiness::{HttpProbe, Probe};
use std::path::Path;
use std::process::Command;

use super::GlobalArgs;

struct CheckResult {
    passed: bool,
    message: String,
}

impl CheckResult {
    fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// A package directory and the npm scripts its launch commands need.
fn check_package(label: &str, dir: &Path, commands: &[&str]) -> Vec<CheckResult> {
    if !dir.is_dir() {
        return vec![CheckResult::fail(format!(
            "{}: directory {} not found",
            label,
            dir.display()
        ))];
    }

    let mut results = Vec::new();
    let needed: Vec<&str> = commands
        .iter()
        .filter_map(|c| project::npm_script(c))
        .collect();

    if !needed.is_empty() {
        match project::package_scripts(dir) {
            Ok(scripts) => {
                let missing: Vec<&str> = needed
                    .iter()
                    .filter(|s| !scripts.iter().any(|have| have == *s))
                    .copied()
                    .collect();
                if missing.is_empty() {
                    results.push(CheckResult::pass(format!(
                        "{}: package.json scripts OK ({})",
                        label,
                        needed.join(", ")
                    )));
                } else {
                    results.push(CheckResult::fail(format!(
                        "{}: package.json is missing script(s): {}",
                        label,
                        missing.join(", ")
                    )));
                }
            }
            Err(e) => results.push(CheckResult::fail(format!("{}: {:#}", label, e))),
        }
    }

    if dir.join("node_modules").is_dir() {
        results.push(CheckResult::pass(format!("{}: node_modules installed", label)));
    } else {
        results.push(CheckResult::fail(format!(
            "{}: node_modules not found (run: cd {} && npm install)",
            label,
            dir.display()
        )));
    }

    results
}

fn check_server_entry(dir: &Path, command: &str) -> Option<CheckResult> {
    let entry = project::node_entry(command)?;
    let path = dir.join(entry);
    Some(if path.is_file() {
        CheckResult::pass(format!("Frontend server entry {} found", entry))
    } else {
        CheckResult::fail(format!("Frontend server entry {} not found", path.display()))
    })
}

fn check_tool(name: &str, label: &str, install_hint: &str) -> CheckResult {
    // npm is a .cmd shim on Windows and has to go through the shell.
    let output = if cfg!(windows) {
        Command::new("cmd").args(["/C", name, "--version"]).output()
    } else {
        Command::new(name).arg("--version").output()
    };
    match output {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
            CheckResult::pass(format!("{} ({})", label, version))
        }
        Ok(_) => CheckResult::fail(format!("{} found but returned error", label)),
        Err(_) => CheckResult::fail(format!("{} not found (install: {})", label, install_hint)),
    }
}

/// A server that already answers will collide with the one being launched.
fn check_endpoint(probe: &mut dyn Probe, label: &str, url: &str) -> CheckResult {
    if probe.is_ready(url) {
        CheckResult::fail(format!(
            "{} already answering at {} (an earlier launch may still be running)",
            label, url
        ))
    } else {
        CheckResult::pass(format!("{} address {} is free", label, url))
    }
}

pub fn run(global: &GlobalArgs) -> Result<()> {
    let root = project::resolve_root(global.root.as_deref())?;
    println!("{}", "lms-start doctor".bold());
    println!("  root: {}", root.display());
    println!();

    // === Configuration ===
    println!("{}", "Configuration".bold().underline());
    let sources = global.sources(&root);
    let (config_check, config) = match global.load() {
        Ok((_, config)) if sources.project_file.exists() => (
            CheckResult::pass(format!("{} found and valid", sources.project_file.display())),
            config,
        ),
        Ok((_, config)) => (
            CheckResult::pass("No lms.toml (using built-in defaults)"),
            config,
        ),
        Err(e) => (
            CheckResult::fail(format!("Configuration invalid: {:#}", e)),
            LauncherConfig::default(),
        ),
    };
    let config_checks = vec![config_check];
    print_checks(&config_checks);

    // === Packages ===
    println!();
    println!("{}", "Packages".bold().underline());
    let shared_dir = root.join(&config.shared.dir);
    let backend_dir = root.join(&config.backend.dir);
    let frontend_dir = root.join(&config.frontend.dir);
    let mut package_checks = Vec::new();
    package_checks.extend(check_package(
        "Shared",
        &shared_dir,
        &[config.shared.build.as_str()],
    ));
    package_checks.extend(check_package(
        "Backend",
        &backend_dir,
        &[config.backend.command.as_str()],
    ));
    package_checks.extend(check_package(
        "Frontend",
        &frontend_dir,
        &[config.frontend.build.as_str(), config.frontend.command.as_str()],
    ));
    package_checks.extend(check_server_entry(&frontend_dir, &config.frontend.command));
    print_checks(&package_checks);

    // === Tools ===
    println!();
    println!("{}", "Development Tools".bold().underline());
    let tool_checks = vec![
        check_tool("node", "Node.js", "https://nodejs.org"),
        check_tool("npm", "npm", "https://nodejs.org"),
    ];
    print_checks(&tool_checks);

    // === Endpoints ===
    println!();
    println!("{}", "Endpoints".bold().underline());
    let mut probe = HttpProbe::new()?;
    let endpoint_checks = vec![
        check_endpoint(&mut probe, "Backend", &config.backend.url),
        check_endpoint(&mut probe, "Frontend", &config.frontend.url),
    ];
    print_checks(&endpoint_checks);

    // === Summary ===
    let all_checks: Vec<&CheckResult> = config_checks
        .iter()
        .chain(package_checks.iter())
        .chain(tool_checks.iter())
        .chain(endpoint_checks.iter())
        .collect();

    let total = all_checks.len();
    let passed = all_checks.iter().filter(|c| c.passed).count();
    let failed = total - passed;

    println!();
    let summary = format!("{}/{} checks passed", passed, total);
    if failed == 0 {
        println!("{}", summary.green().bold());
    } else {
        println!("{}", summary.yellow().bold());
        println!(
            "{}",
            format!("{} issue(s) found, see above for details", failed).yellow()
        );
    }

    Ok(())
}

fn print_checks(checks: &[CheckResult]) {
    for check in checks {
        if check.passed {
            println!("  {} {}", "\u{2713}".green(), check.message);
        } else {
            println!("  {} {}", "\u{2717}".red(), check.message);
        }
    }
}
