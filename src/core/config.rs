//! Configuration management with layered hierarchy

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::core::Workspace;

/// Ledger configuration with layered hierarchy
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format
    pub default_format: Option<String>,

    /// Database file, relative to .shg/ unless absolute
    pub database: Option<String>,

    /// Log level or tracing filter directive
    pub log_level: Option<String>,

    /// Title for rendered reports
    pub report_title: Option<String>,

    /// Config files that could not be used, reported once logging is up
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl Config {
    /// Load configuration from all sources, merging in priority order
    pub fn load(workspace: Option<&Path>) -> Self {
        let mut config = Config::default();

        // 1. Built-in defaults (already in Default impl)

        // 2. Global user config (~/.config/shg/config.yaml)
        if let Some(global_path) = Self::global_config_path() {
            config.merge_file(&global_path);
        }

        // 3. Workspace config (.shg/config.yaml)
        let discovered = match workspace {
            Some(dir) => Workspace::discover_from(dir),
            None => Workspace::discover(),
        };
        if let Ok(ws) = discovered {
            config.merge_file(&ws.config_path());
        }

        // 4. Environment variables
        config.merge(Self::from_env(|key| std::env::var(key).ok()));

        config
    }

    fn merge_file(&mut self, path: &Path) {
        match Self::read_file(path) {
            Ok(Some(other)) => self.merge(other),
            Ok(None) => {}
            Err(warning) => self.warnings.push(warning),
        }
    }

    fn read_file(path: &Path) -> Result<Option<Config>, String> {
        if !path.exists() {
            return Ok(None);
        }
        let unreadable = |e: &dyn std::fmt::Display| {
            format!("ignoring unreadable config {}: {}", path.display(), e)
        };
        let contents = std::fs::read_to_string(path).map_err(|e| unreadable(&e))?;
        serde_yml::from_str::<Config>(&contents)
            .map(Some)
            .map_err(|e| unreadable(&e))
    }

    /// Log the problems met while loading
    pub fn emit_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!("{}", warning);
        }
    }

    fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Config {
        Config {
            default_format: lookup("SHG_DEFAULT_FORMAT"),
            database: lookup("SHG_DATABASE"),
            log_level: lookup("SHG_LOG"),
            ..Default::default()
        }
    }

    /// Get the path to the global config file
    fn global_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "shg")
            .map(|dirs| dirs.config_dir().join("config.yaml"))
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        if other.default_format.is_some() {
            self.default_format = other.default_format;
        }
        if other.database.is_some() {
            self.database = other.database;
        }
        if other.log_level.is_some() {
            self.log_level = other.log_level;
        }
        if other.report_title.is_some() {
            self.report_title = other.report_title;
        }
    }

    /// Title for rendered reports, falling back to the report's own name
    pub fn report_title<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.report_title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(fallback)
    }
}
