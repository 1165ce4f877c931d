use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the project-level config file, looked up in the project root.
pub const CONFIG_FILE: &str = "lms.toml";

/// Upper bound for every delay and timeout, in seconds.
pub const MAX_WAIT_SECS: u64 = 3600;
/// Upper bound for `readiness.interval_ms`.
pub const MAX_INTERVAL_MS: u64 = 60_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LauncherConfig {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub shared: SharedConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub frontend: FrontendConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub readiness: ReadinessConfig,
    #[serde(default)]
    pub console: ConsoleConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    #[serde(default = "default_credentials")]
    pub credentials: Vec<Credential>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Title shown in the opening banner.
    pub name: String,
    /// Shorter name used in the "is running!" banner.
    pub short_name: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: "RME Learning Management System".to_string(),
            short_name: "RME LMS".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedConfig {
    pub dir: PathBuf,
    pub build: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("shared"),
            build: "npm run build".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub dir: PathBuf,
    pub command: String,
    pub url: String,
    /// Appended to `url` when polling for readiness.
    pub health_path: String,
    pub start_delay_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("backend"),
            command: "npm run dev".to_string(),
            url: "http://10.10.11.243:3001".to_string(),
            health_path: "/health".to_string(),
            start_delay_secs: 8,
        }
    }
}

impl BackendConfig {
    pub fn health_url(&self) -> String {
        let base = self.url.trim_end_matches('/');
        if self.health_path.is_empty() {
            base.to_string()
        } else if self.health_path.starts_with('/') {
            format!("{}{}", base, self.health_path)
        } else {
            format!("{}/{}", base, self.health_path)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub dir: PathBuf,
    pub build: String,
    pub command: String,
    pub url: String,
    pub start_delay_secs: u64,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("frontend"),
            build: "npm run build".to_string(),
            command: "node server.js".to_string(),
            url: "http://10.10.11.243:5173".to_string(),
            start_delay_secs: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub open: bool,
    pub delay_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            open: true,
            delay_secs: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessMode {
    /// Sleep a fixed delay after each server launch.
    #[default]
    Fixed,
    /// Request the service until it answers or the timeout passes.
    Poll,
}

impl std::str::FromStr for ReadinessMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "fixed" => Ok(ReadinessMode::Fixed),
            "poll" => Ok(ReadinessMode::Poll),
            other => bail!("Unknown readiness mode '{}' (expected: fixed, poll)", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    pub mode: ReadinessMode,
    pub interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            mode: ReadinessMode::Fixed,
            interval_ms: 500,
            timeout_secs: 60,
        }
    }
}

impl ReadinessConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Wait for Enter before exiting, after success as well as failure.
    pub pause_on_exit: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            pause_on_exit: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Selects the `lms.<active>.toml` overlay.
    #[serde(default = "default_environment")]
    pub active: String,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            active: default_environment(),
        }
    }
}

fn default_environment() -> String {
    "development".to_string()
}

/// Example login printed once everything is up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub label: String,
    pub email: String,
    pub password: String,
}

fn default_credentials() -> Vec<Credential> {
    vec![
        Credential {
            label: "Admin".to_string(),
            email: "admin@company.com".to_string(),
            password: "admin123".to_string(),
        },
        Credential {
            label: "Employee".to_string(),
            email: "employee1@company.com".to_string(),
            password: "password123".to_string(),
        },
    ]
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            project: ProjectConfig::default(),
            shared: SharedConfig::default(),
            backend: BackendConfig::default(),
            frontend: FrontendConfig::default(),
            browser: BrowserConfig::default(),
            readiness: ReadinessConfig::default(),
            console: ConsoleConfig::default(),
            environment: EnvironmentConfig::default(),
            credentials: default_credentials(),
        }
    }
}

/// Values given on the command line. `None`/`false` leaves the config untouched.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub backend_url: Option<String>,
    pub frontend_url: Option<String>,
    pub readiness: Option<ReadinessMode>,
    pub no_browser: bool,
    pub no_pause: bool,
}

/// Files that make up a config, lowest precedence first.
#[derive(Debug, Clone)]
pub struct ConfigSources {
    pub user_file: Option<PathBuf>,
    pub project_file: PathBuf,
    /// Named on the command line; a missing `project_file` is then an error.
    pub explicit: bool,
    /// Active environment from the process environment, beats `[environment] active`.
    pub env: Option<String>,
}

impl ConfigSources {
    /// Standard lookup: `~/.lms-start/config.toml`, then `<root>/lms.toml`
    /// (or `explicit`), with `LMS_ENV` selecting the overlay.
    pub fn discover(root: &Path, explicit: Option<&Path>) -> Self {
        let project_file = match explicit {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => root.join(path),
            None => root.join(CONFIG_FILE),
        };
        Self {
            user_file: user_config_path(),
            project_file,
            explicit: explicit.is_some(),
            env: std::env::var("LMS_ENV").ok().filter(|v| !v.is_empty()),
        }
    }
}

/// `~/.lms-start/config.toml`, if a home directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".lms-start").join("config.toml"))
}

/// Deep-merge two TOML values. The `override_val` takes precedence over `base`.
/// Tables are merged recursively; all other types (arrays included) are replaced.
fn deep_merge(base: toml::Value, override_val: toml::Value) -> toml::Value {
    match (base, override_val) {
        (toml::Value::Table(mut base_table), toml::Value::Table(override_table)) => {
            for (key, override_v) in override_table {
                let merged = if let Some(base_v) = base_table.remove(&key) {
                    deep_merge(base_v, override_v)
                } else {
                    override_v
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_base, override_val) => override_val,
    }
}

fn read_toml(path: &Path) -> Result<toml::Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value: toml::Value = toml::from_str(&content)
        .with_context(|| format!("Invalid TOML in {}", path.display()))?;
    Ok(value)
}

impl LauncherConfig {
    /// Load every layer in `sources`. Missing files are skipped, so a project
    /// without any config runs with the built-in defaults. An explicitly named
    /// project file has to exist.
    ///
    /// 1. `user_file`
    /// 2. `project_file`
    /// 3. `lms.{env}.toml` next to `project_file`, where env is `sources.env`,
    ///    else `[environment] active` from the merged layers, else "development"
    pub fn load_layered(sources: &ConfigSources) -> Result<Self> {
        let mut merged = toml::Value::Table(toml::Table::new());

        if let Some(user_file) = &sources.user_file {
            if user_file.exists() {
                merged = deep_merge(merged, read_toml(user_file)?);
            }
        }
        if sources.project_file.exists() {
            merged = deep_merge(merged, read_toml(&sources.project_file)?);
        } else if sources.explicit {
            bail!("Config file not found: {}", sources.project_file.display());
        }

        let env_name = sources.env.clone().unwrap_or_else(|| {
            merged
                .get("environment")
                .and_then(|e| e.get("active"))
                .and_then(|a| a.as_str())
                .unwrap_or("development")
                .to_string()
        });

        let overlay = sources
            .project_file
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(format!("lms.{}.toml", env_name));
        if overlay.exists() {
            merged = deep_merge(merged, read_toml(&overlay)?);
        }

        let mut config: LauncherConfig = merged
            .try_into()
            .context("Invalid launcher configuration")?;
        config.environment.active = env_name;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.backend_url {
            self.backend.url = url.clone();
        }
        if let Some(url) = &overrides.frontend_url {
            self.frontend.url = url.clone();
        }
        if let Some(mode) = overrides.readiness {
            self.readiness.mode = mode;
        }
        if overrides.no_browser {
            self.browser.open = false;
        }
        if overrides.no_pause {
            self.console.pause_on_exit = false;
        }
    }

    /// Reject values the launcher cannot act on, before any step runs.
    pub fn validate(&self) -> Result<()> {
        validate_url("backend.url", &self.backend.url)?;
        validate_url("frontend.url", &self.frontend.url)?;
        for (key, command) in [
            ("shared.build", &self.shared.build),
            ("backend.command", &self.backend.command),
            ("frontend.build", &self.frontend.build),
            ("frontend.command", &self.frontend.command),
        ] {
            if command.trim().is_empty() {
                bail!("{} must not be empty", key);
            }
        }
        if self.readiness.mode == ReadinessMode::Poll && self.readiness.interval_ms == 0 {
            bail!("readiness.interval_ms must be greater than 0 in poll mode");
        }
        if self.readiness.interval_ms > MAX_INTERVAL_MS {
            bail!("readiness.interval_ms must be at most {}", MAX_INTERVAL_MS);
        }
        for (key, secs) in [
            ("readiness.timeout_secs", self.readiness.timeout_secs),
            ("backend.start_delay_secs", self.backend.start_delay_secs),
            ("frontend.start_delay_secs", self.frontend.start_delay_secs),
            ("browser.delay_secs", self.browser.delay_secs),
        ] {
            if secs > MAX_WAIT_SECS {
                bail!("{} must be at most {} seconds, got {}", key, MAX_WAIT_SECS, secs);
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    let parsed =
        reqwest::Url::parse(url).with_context(|| format!("{} is not a valid URL: {}", key, url))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => bail!("{} must use http or https, got '{}'", key, other),
    }
}
