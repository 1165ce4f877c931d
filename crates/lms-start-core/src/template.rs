use anyhow::{Context as _, Result};
use lms_start_templates::Templates;
use tera::{Context, Tera};

use crate::config::LauncherConfig;
use crate::console;

pub const BANNER: &str = "banner.txt.tera";
pub const SUMMARY: &str = "summary.txt.tera";
pub const DEFAULT_CONFIG: &str = "lms.toml";

pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Only .tera files are templates; the rest are read with get_raw().
        for file in Templates::iter() {
            let path = file.as_ref();
            if !path.ends_with(".tera") {
                continue;
            }
            if let Some(content) = Templates::get(path) {
                let content_str = std::str::from_utf8(content.data.as_ref())?;
                tera.add_raw_template(path, content_str)?;
            }
        }

        Ok(TemplateEngine { tera })
    }

    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        let result = self
            .tera
            .render(template_name, context)
            .with_context(|| format!("Failed to render template '{}'", template_name))?;
        Ok(result)
    }

    /// Read an embedded file as raw string without Tera rendering.
    pub fn get_raw(&self, path: &str) -> Result<String> {
        let content = Templates::get(path)
            .with_context(|| format!("Embedded file '{}' not found", path))?;
        let s = std::str::from_utf8(content.data.as_ref())
            .with_context(|| format!("Invalid UTF-8 in '{}'", path))?;
        Ok(s.to_string())
    }

    /// The "is running!" block printed once both servers are launched.
    pub fn banner(&self, config: &LauncherConfig) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert("rule", &console::rule());
        ctx.insert("short_name", &config.project.short_name);
        ctx.insert("backend_url", &config.backend.url);
        ctx.insert("frontend_url", &config.frontend.url);
        ctx.insert("open_browser", &config.browser.open);
        ctx.insert("browser_delay", &config.browser.delay_secs);
        self.render(BANNER, &ctx)
    }

    /// Closing block with the example logins.
    pub fn summary(&self, config: &LauncherConfig) -> Result<String> {
        let mut ctx = Context::new();
        ctx.insert("credentials", &config.credentials);
        self.render(SUMMARY, &ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_template_matches_builtin_defaults() {
        let engine = TemplateEngine::new().unwrap();
        let raw = engine.get_raw(DEFAULT_CONFIG).unwrap();
        let parsed: LauncherConfig = toml::from_str(&raw).unwrap();
        assert_eq!(parsed, LauncherConfig::default());
    }

    #[test]
    fn banner_lists_both_endpoints() {
        let engine = TemplateEngine::new().unwrap();
        let text = engine.banner(&LauncherConfig::default()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "=".repeat(55));
        assert_eq!(lines[1], "   🎉 RME LMS is running!");
        assert_eq!(lines[2], "");
        assert_eq!(lines[3], "   Backend:  http://10.10.11.243:3001");
        assert_eq!(lines[4], "   Frontend: http://10.10.11.243:5173");
        assert_eq!(lines[6], "   Opening browser in 3 seconds...");
        assert_eq!(lines[7], "=".repeat(55));
        assert_eq!(lines.len(), 8);
    }

    #[test]
    fn banner_without_browser() {
        let engine = TemplateEngine::new().unwrap();
        let mut config = LauncherConfig::default();
        config.browser.open = false;
        let text = engine.banner(&config).unwrap();
        assert!(text.contains("Browser launch disabled"));
        assert!(!text.contains("Opening browser"));
    }

    #[test]
    fn summary_prints_each_credential() {
        let engine = TemplateEngine::new().unwrap();
        let text = engine.summary(&LauncherConfig::default()).unwrap();
        assert!(text.contains("🎯 System started successfully!"));
        assert!(text.contains("📝 Login credentials:"));
        assert!(text.contains("   Admin: admin@company.com / admin123\n"));
        assert!(text.contains("   Employee: employee1@company.com / password123\n"));
        assert!(text.trim_end().ends_with("\n\nYou can close this window now."));
    }

    #[test]
    fn summary_skips_empty_credentials() {
        let engine = TemplateEngine::new().unwrap();
        let mut config = LauncherConfig::default();
        config.credentials.clear();
        let text = engine.summary(&config).unwrap();
        assert!(!text.contains("Login credentials"));
        assert!(text.contains("You can close this window now."));
    }
}
