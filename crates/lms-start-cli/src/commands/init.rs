use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::Confirm;
use lms_start_core::config::CONFIG_FILE;
use lms_start_core::project;
use lms_start_core::template::{TemplateEngine, DEFAULT_CONFIG};

use super::GlobalArgs;

/// Write the embedded default config. An existing file is only replaced
/// with `--force` or after confirmation.
pub fn run(global: &GlobalArgs, force: bool) -> Result<()> {
    let root = project::resolve_root(global.root.as_deref())?;
    let path = match &global.config {
        Some(p) if p.is_absolute() => p.clone(),
        Some(p) => root.join(p),
        None => root.join(CONFIG_FILE),
    };

    if path.exists() && !force {
        let overwrite = Confirm::new()
            .with_prompt(format!("{} already exists. Overwrite?", path.display()))
            .default(false)
            .interact()?;
        if !overwrite {
            println!("  {} {} (kept existing file)", "skip".yellow(), path.display());
            return Ok(());
        }
    }

    let engine = TemplateEngine::new()?;
    let content = engine.get_raw(DEFAULT_CONFIG)?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    println!("  {} {}", "create".green(), path.display());
    println!();
    println!("Edit the URLs and commands, then run: {}", "lms-start".bold());
    Ok(())
}
