//! Layered configuration for dashq
//!
//! Built-in defaults, then `config.toml` from the XDG config directory, then
//! `DASHQ__SECTION__KEY` environment variables, then command-line flags.

use std::env;
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use config::{Config, Environment, File, FileFormat};
use env_logger::fmt::WriteStyle;
use log::LevelFilter;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::activity::DEFAULT_SETTLE_DELAY;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::fuzzy::{
    FieldWeights, Highlight, SearchOptions, DEFAULT_MIN_MATCH_LENGTH, DEFAULT_SUGGESTION_LIMIT,
    DEFAULT_THRESHOLD,
};

const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// Parsed flags plus the merged configuration, shared by every command
#[derive(Debug, Clone)]
pub struct RuntimeContext {
    pub global: GlobalOpts,
    pub config: AppConfig,
    config_path: PathBuf,
}

impl RuntimeContext {
    pub fn new(global: &GlobalOpts) -> Result<Self> {
        let config_path = resolve_config_path(global.config.as_ref())?;
        let config = load_config(&config_path, global)?;

        Ok(Self {
            global: global.clone(),
            config,
            config_path,
        })
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn init_logging(&self) -> Result<()> {
        if self.global.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }

        let mut builder = env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(&self.config.logging.level),
        );

        if let Some(level) = self.cli_log_level() {
            builder.filter_level(level);
        }

        builder.write_style(log_style(self.global.no_color));

        if let Err(err) = builder.try_init() {
            if self.global.verbose > 0 {
                eprintln!("logger already initialized: {err}");
            }
        }
        Ok(())
    }

    /// Level requested on the command line, if any
    fn cli_log_level(&self) -> Option<LevelFilter> {
        if self.global.trace {
            Some(LevelFilter::Trace)
        } else if self.global.debug {
            Some(LevelFilter::Debug)
        } else {
            match self.global.verbose {
                0 => None,
                1 => Some(LevelFilter::Info),
                2 => Some(LevelFilter::Debug),
                _ => Some(LevelFilter::Trace),
            }
        }
    }

    /// Catalog file to load; `None` means the built-in demo catalog
    pub fn catalog_path(&self) -> Result<Option<PathBuf>> {
        match self
            .global
            .catalog
            .as_ref()
            .or(self.config.catalog.path.as_ref())
        {
            Some(path) => Ok(Some(expand_path(path)?)),
            None => Ok(None),
        }
    }

    /// `--json` beats `-o`, which beats `output.format`
    pub fn output_format(&self) -> OutputFormat {
        if self.global.json {
            OutputFormat::Json
        } else if let Some(format) = self.global.output_format {
            format
        } else {
            OutputFormat::from_str(&self.config.output.format, true).unwrap_or(OutputFormat::Auto)
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        self.config.search.options()
    }

    pub fn highlight(&self) -> Highlight {
        Highlight {
            open: self.config.search.highlight_open.clone(),
            close: self.config.search.highlight_close.clone(),
        }
    }

    pub fn suggestion_limit(&self) -> usize {
        self.config.search.suggestion_limit
    }

    pub fn settle_delay(&self) -> Result<Duration> {
        humantime::parse_duration(&self.config.search.settle_delay)
            .with_context(|| format!("parsing search.settle_delay '{}'", self.config.search.settle_delay))
    }
}

/// Contents of `config.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub search: SearchConfig,
    pub catalog: CatalogConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub threshold: f64,
    pub min_match_length: usize,
    pub suggestion_limit: usize,
    /// Humantime duration, e.g. "150ms"
    pub settle_delay: String,
    pub highlight_open: String,
    pub highlight_close: String,
    /// Run searches on a background thread
    pub offload: bool,
    pub weights: FieldWeights,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let highlight = Highlight::default();
        Self {
            threshold: DEFAULT_THRESHOLD,
            min_match_length: DEFAULT_MIN_MATCH_LENGTH,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            settle_delay: humantime::format_duration(DEFAULT_SETTLE_DELAY).to_string(),
            highlight_open: highlight.open,
            highlight_close: highlight.close,
            offload: false,
            weights: FieldWeights::default(),
        }
    }
}

impl SearchConfig {
    pub fn options(&self) -> SearchOptions {
        SearchOptions {
            weights: self.weights,
            threshold: self.threshold,
            min_match_length: self.min_match_length,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            bail!(
                "search.threshold must be between 0 and 1, got {}",
                self.threshold
            );
        }
        let w = &self.weights;
        if [w.name, w.area, w.id, w.domain].iter().any(|v| *v < 0.0) {
            bail!("search.weights must not be negative");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// JSON or YAML file with the entity catalog
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: String,
    pub no_headers: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "auto".to_string(),
            no_headers: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

fn resolve_config_path(override_path: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        let expanded = expand_path(path)?;
        if expanded.is_dir() {
            return Ok(expanded.join("config.toml"));
        }
        return Ok(expanded);
    }

    Ok(default_config_dir()?.join("config.toml"))
}

fn load_config(config_path: &Path, global: &GlobalOpts) -> Result<AppConfig> {
    if !config_path.exists() {
        write_default_config(config_path)?;
    }

    let config = Config::builder()
        .set_default("search.threshold", DEFAULT_THRESHOLD)?
        .set_default("search.min_match_length", DEFAULT_MIN_MATCH_LENGTH as i64)?
        .set_default("search.suggestion_limit", DEFAULT_SUGGESTION_LIMIT as i64)?
        .set_default("search.settle_delay", "150ms")?
        .set_default("search.offload", false)?
        .set_default("output.format", "auto")?
        .set_default("output.no_headers", false)?
        .set_default("logging.level", "warn")?
        .add_source(
            File::from(config_path)
                .format(FileFormat::Toml)
                .required(false),
        )
        // Environment variable overrides (DASHQ__SEARCH__THRESHOLD=0.4, ...)
        .add_source(
            Environment::with_prefix("DASHQ")
                .prefix_separator("__")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut app_config: AppConfig = config
        .try_deserialize()
        .with_context(|| format!("reading config {}", config_path.display()))?;

    if global.no_headers {
        app_config.output.no_headers = true;
    }
    if let Some(threshold) = global.threshold {
        app_config.search.threshold = threshold;
    }

    app_config.search.validate()?;
    Ok(app_config)
}

pub fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {}", parent.display()))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config")?;

    let content = format!(
        "# dashq configuration\n\
        # File: {}\n\
        #\n\
        # Environment variables:\n\
        #   DASHQ_CATALOG - Entity catalog file (JSON or YAML)\n\
        #   DASHQ__*      - Override any config value (e.g., DASHQ__SEARCH__THRESHOLD=0.4)\n\
        \n\
        {toml}",
        path.display()
    );

    fs::write(path, content).with_context(|| format!("writing config to {}", path.display()))
}

/// `--no-color` and `NO_COLOR` win over `FORCE_COLOR`; otherwise colour only on a terminal
fn log_style(no_color: bool) -> WriteStyle {
    if no_color || env::var_os("NO_COLOR").is_some() {
        WriteStyle::Never
    } else if env::var_os("FORCE_COLOR").is_some() {
        WriteStyle::Always
    } else if std::io::stderr().is_terminal() {
        WriteStyle::Auto
    } else {
        WriteStyle::Never
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        let expanded = shellexpand::full(text).context("expanding path")?;
        Ok(PathBuf::from(expanded.to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

fn default_config_dir() -> Result<PathBuf> {
    // Check XDG_CONFIG_HOME first
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    // Use platform-specific config directory
    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    // Fallback to ~/.config
    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.search.threshold, 0.3);
        assert_eq!(config.search.min_match_length, 1);
        assert_eq!(config.search.suggestion_limit, 5);
        assert_eq!(config.search.settle_delay, "150ms");
        assert_eq!(config.search.weights, FieldWeights::default());
        assert!(config.catalog.path.is_none());
        assert_eq!(config.output.format, "auto");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[search]"));
        assert!(toml.contains("[search.weights]"));
        assert!(toml.contains("[output]"));
        assert!(toml.contains("[logging]"));
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut search = SearchConfig::default();
        assert!(search.validate().is_ok());

        search.threshold = 1.5;
        assert!(search.validate().is_err());

        search.threshold = 0.3;
        search.weights.area = -0.1;
        assert!(search.validate().is_err());
    }

    #[test]
    fn test_settle_delay_round_trips_through_humantime() {
        let config = SearchConfig::default();
        let parsed = humantime::parse_duration(&config.settle_delay).unwrap();
        assert_eq!(parsed, DEFAULT_SETTLE_DELAY);
    }

    #[test]
    fn test_log_style_respects_no_color_flag() {
        assert!(matches!(log_style(true), WriteStyle::Never));
    }

    #[test]
    fn test_write_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        write_default_config(&path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# dashq configuration"));
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.search.threshold, DEFAULT_THRESHOLD);
    }
}
