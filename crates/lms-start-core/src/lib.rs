pub mod browser;
pub mod config;
pub mod console;
pub mod exec;
pub mod launcher;
pub mod project;
pub mod readiness;
pub mod template;
