use anyhow::Result;
use colored::Colorize;

use super::GlobalArgs;

pub fn run(global: &GlobalArgs) -> Result<()> {
    let (root, config) = global.load()?;
    let sources = global.sources(&root);

    println!("{}", format!("# root: {}", root.display()).dimmed());
    let project_file = if sources.project_file.exists() {
        sources.project_file.display().to_string()
    } else {
        format!("{} (not found, using defaults)", sources.project_file.display())
    };
    println!("{}", format!("# config: {}", project_file).dimmed());
    println!(
        "{}",
        format!("# environment: {}", config.environment.active).dimmed()
    );
    println!();
    print!("{}", config.to_toml()?);
    Ok(())
}
