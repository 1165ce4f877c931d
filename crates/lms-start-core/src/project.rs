use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::CONFIG_FILE;

/// Standard package directories, used to recognise a project root before
/// any config has been read.
pub const PACKAGE_DIRS: [&str; 3] = ["shared", "backend", "frontend"];

/// A directory is a project root when it has an `lms.toml` or all three
/// package directories.
pub fn looks_like_project(dir: &Path) -> bool {
    dir.join(CONFIG_FILE).is_file() || PACKAGE_DIRS.iter().all(|d| dir.join(d).is_dir())
}

/// Pick the directory the package paths are relative to.
///
/// 1. `explicit` (`--root`), which must exist
/// 2. the directory holding the running executable, when it looks like a project
/// 3. the current directory
pub fn resolve_root(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = explicit {
        return dir
            .canonicalize()
            .with_context(|| format!("Project root not found: {}", dir.display()));
    }

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        if looks_like_project(&exe_dir) {
            return Ok(exe_dir);
        }
    }

    std::env::current_dir().context("Could not determine the current directory")
}

/// Script names declared in `<dir>/package.json`.
pub fn package_scripts(dir: &Path) -> Result<Vec<String>> {
    let path = dir.join("package.json");
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let manifest: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;
    let scripts = manifest
        .get("scripts")
        .and_then(|s| s.as_object())
        .map(|s| s.keys().cloned().collect())
        .unwrap_or_default();
    Ok(scripts)
}

/// `npm run build` → `build`. Anything that is not an `npm run` line → `None`.
pub fn npm_script(command: &str) -> Option<&str> {
    let mut words = command.split_whitespace();
    match (words.next(), words.next(), words.next()) {
        (Some("npm"), Some("run"), Some(script)) => Some(script),
        _ => None,
    }
}

/// `node server.js` → `server.js`.
pub fn node_entry(command: &str) -> Option<&str> {
    let mut words = command.split_whitespace();
    match (words.next(), words.next()) {
        (Some("node"), Some(entry)) if !entry.starts_with('-') => Some(entry),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn project_detected_by_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!looks_like_project(dir.path()));

        fs::create_dir(dir.path().join("shared")).unwrap();
        fs::create_dir(dir.path().join("backend")).unwrap();
        assert!(!looks_like_project(dir.path()));

        fs::create_dir(dir.path().join("frontend")).unwrap();
        assert!(looks_like_project(dir.path()));
    }

    #[test]
    fn project_detected_by_config_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("lms.toml"), "").unwrap();
        assert!(looks_like_project(dir.path()));
    }

    #[test]
    fn explicit_root_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let root = resolve_root(Some(dir.path())).unwrap();
        assert_eq!(root, dir.path().canonicalize().unwrap());
        assert!(resolve_root(Some(&dir.path().join("missing"))).is_err());
    }

    #[test]
    fn reads_script_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "backend", "scripts": { "dev": "tsx watch src/index.ts", "build": "tsc" } }"#,
        )
        .unwrap();
        let mut scripts = package_scripts(dir.path()).unwrap();
        scripts.sort();
        assert_eq!(scripts, vec!["build", "dev"]);
    }

    #[test]
    fn package_without_scripts_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "name": "shared" }"#).unwrap();
        assert!(package_scripts(dir.path()).unwrap().is_empty());
        assert!(package_scripts(&dir.path().join("nowhere")).is_err());
    }

    #[test]
    fn command_line_parsing() {
        assert_eq!(npm_script("npm run build"), Some("build"));
        assert_eq!(npm_script("npm  run dev -- --port 3001"), Some("dev"));
        assert_eq!(npm_script("node server.js"), None);
        assert_eq!(node_entry("node server.js"), Some("server.js"));
        assert_eq!(node_entry("node --inspect server.js"), None);
        assert_eq!(node_entry("npm start"), None);
    }
}
