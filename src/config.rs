// =============================================================================
// CONFIGURATION - Load settings from config.toml
// =============================================================================
//
// This module handles loading and parsing configuration from config.toml.
// Provides sensible defaults if config file is missing or has errors.

use anyhow::{Context, Result};
use ash::vk;
use serde::Deserialize;
use std::path::Path;

/// Root configuration structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub validation: ValidationConfig,
    pub compute: ComputeConfig,
    pub shader: ShaderConfig,
    pub debug: DebugConfig,
}

/// Application identity reported to the driver
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub version: u32,
    pub engine_name: String,
    pub engine_version: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "vulkan-compute-sample".to_string(),
            version: 69420,
            engine_name: "lmaokek".to_string(),
            engine_version: 69420,
        }
    }
}

/// Validation layer settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub enabled: bool,
    pub debug_printf: bool,
    pub min_severity: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            debug_printf: true,
            min_severity: "verbose".to_string(),
        }
    }
}

/// Dispatch settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    pub group_count: [u32; 3],
    pub entry_point: String,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            group_count: [8, 1, 1],
            entry_point: "main".to_string(),
        }
    }
}

/// Shader source settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// GLSL file replacing the embedded shader
    pub source_file: Option<String>,
    /// Name reported by the compiler in diagnostics
    pub file_name: String,
    pub debug_info: bool,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            source_file: None,
            file_name: "hello_world.comp".to_string(),
            debug_info: false,
        }
    }
}

/// Debug settings
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub log_level: String,
    pub log_to_file: bool,
    pub log_file: String,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
            log_file: "vulkan_compute.log".to_string(),
        }
    }
}

/// Messages produced while loading the config, reported once logging is up
pub type LoadReport = Vec<(log::Level, String)>;

impl Config {
    /// Load config.toml, falling back to defaults if it is missing or invalid
    pub fn load() -> (Self, LoadReport) {
        Self::load_or_default("config.toml")
    }

    /// Load configuration from `path`, falling back to defaults on any error.
    ///
    /// Nothing is logged here since the logger is configured from the result;
    /// the caller emits the returned report after `init_logging`.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> (Self, LoadReport) {
        let path = path.as_ref();
        let mut report = LoadReport::new();

        let config = if !path.exists() {
            report.push((
                log::Level::Info,
                format!("Config file not found at {:?}, using defaults", path),
            ));
            Config::default()
        } else {
            match Self::load_from_path(path) {
                Ok(config) => {
                    report.push((log::Level::Info, format!("Loaded configuration from {:?}", path)));
                    config
                }
                Err(e) => {
                    report.push((
                        log::Level::Warn,
                        format!("Failed to load {:?}: {:#}. Using defaults.", path, e),
                    ));
                    Config::default()
                }
            }
        };

        if let Err(e) = config.debug.log_level.parse::<log::LevelFilter>() {
            report.push((
                log::Level::Warn,
                format!("Unknown log level '{}' ({}), defaulting to info", config.debug.log_level, e),
            ));
        }

        (config, report)
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }

    /// Reject settings the run cannot honour before any GPU object exists
    pub fn validate(&self) -> Result<()> {
        if self.compute.group_count.contains(&0) {
            anyhow::bail!(
                "Invalid compute.group_count {:?}: every dimension must be at least 1",
                self.compute.group_count
            );
        }
        if self.compute.entry_point.is_empty() {
            anyhow::bail!("compute.entry_point must not be empty");
        }
        Ok(())
    }

    /// Severities the debug messenger subscribes to: the configured minimum and above
    pub fn message_severity(&self) -> vk::DebugUtilsMessageSeverityFlagsEXT {
        use vk::DebugUtilsMessageSeverityFlagsEXT as Severity;

        let error = Severity::ERROR;
        let warning = error | Severity::WARNING;
        let info = warning | Severity::INFO;
        let verbose = info | Severity::VERBOSE;

        match self.validation.min_severity.to_lowercase().as_str() {
            "verbose" => verbose,
            "info" => info,
            "warning" | "warn" => warning,
            "error" => error,
            _ => {
                log::warn!(
                    "Unknown message severity '{}', defaulting to verbose",
                    self.validation.min_severity
                );
                verbose
            }
        }
    }

    /// Default log filter, overridden by RUST_LOG. Unknown levels fall back to info
    /// and are reported by `load_or_default`.
    pub fn log_level_filter(&self) -> log::LevelFilter {
        self.debug.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_sample_program() {
        let config = Config::default();

        assert_eq!(config.app.name, "vulkan-compute-sample");
        assert_eq!(config.app.version, 69420);
        assert!(config.validation.enabled);
        assert!(config.validation.debug_printf);
        assert_eq!(config.compute.group_count, [8, 1, 1]);
        assert_eq!(config.compute.entry_point, "main");
        assert_eq!(config.shader.file_name, "hello_world.comp");
        assert!(config.shader.source_file.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let config = Config::from_toml_str(
            r#"
            [compute]
            group_count = [4, 2, 1]

            [validation]
            enabled = false
            "#,
        )
        .unwrap();

        assert_eq!(config.compute.group_count, [4, 2, 1]);
        assert_eq!(config.compute.entry_point, "main");
        assert!(!config.validation.enabled);
        assert!(config.validation.debug_printf);
        assert_eq!(config.app.engine_name, "lmaokek");
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::from_toml_str("[compute]\ngroup_count = \"eight\"").is_err());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from_path("definitely/not/here/config.toml").unwrap();
        assert_eq!(config.compute.group_count, [8, 1, 1]);

        let (config, report) = Config::load_or_default("definitely/not/here/config.toml");
        assert_eq!(config.compute.group_count, [8, 1, 1]);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].0, log::Level::Info);
    }

    fn write_temp_config(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "vulkan-compute-sample-{}-{}.toml",
            name,
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn malformed_file_falls_back_to_defaults_with_a_warning() {
        let path = write_temp_config("malformed", "[compute]\ngroup_count = \"eight\"\n");

        let (config, report) = Config::load_or_default(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(config.compute.group_count, [8, 1, 1]);
        let warnings: Vec<_> = report
            .iter()
            .filter(|(level, _)| *level == log::Level::Warn)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].1.contains("Using defaults"));
        assert!(warnings[0].1.contains("Failed to parse config file"));
    }

    #[test]
    fn valid_file_is_reported_as_loaded() {
        let path = write_temp_config("valid", "[compute]\ngroup_count = [2, 2, 2]\n");

        let (config, report) = Config::load_or_default(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(config.compute.group_count, [2, 2, 2]);
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].0, log::Level::Info);
        assert!(report[0].1.contains("Loaded configuration"));
    }

    #[test]
    fn unknown_log_level_is_reported() {
        let path = write_temp_config("level", "[debug]\nlog_level = \"chatty\"\n");

        let (config, report) = Config::load_or_default(&path);
        std::fs::remove_file(&path).ok();

        assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
        assert!(report
            .iter()
            .any(|(level, message)| *level == log::Level::Warn && message.contains("chatty")));
    }

    #[test]
    fn zero_sized_dispatch_is_rejected() {
        let mut config = Config::default();
        config.compute.group_count = [8, 0, 1];
        assert!(config.validate().is_err());

        config.compute.group_count = [1, 1, 1];
        config.compute.entry_point.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn severity_threshold_includes_everything_above_it() {
        use vk::DebugUtilsMessageSeverityFlagsEXT as Severity;

        let mut config = Config::default();
        assert_eq!(
            config.message_severity(),
            Severity::VERBOSE | Severity::INFO | Severity::WARNING | Severity::ERROR
        );

        config.validation.min_severity = "Warning".to_string();
        assert_eq!(config.message_severity(), Severity::WARNING | Severity::ERROR);

        config.validation.min_severity = "error".to_string();
        assert_eq!(config.message_severity(), Severity::ERROR);

        config.validation.min_severity = "loud".to_string();
        assert!(config.message_severity().contains(Severity::VERBOSE));
    }

    #[test]
    fn log_level_parses_case_insensitively() {
        let mut config = Config::default();
        config.debug.log_level = "DEBUG".to_string();
        assert_eq!(config.log_level_filter(), log::LevelFilter::Debug);

        config.debug.log_level = "chatty".to_string();
        assert_eq!(config.log_level_filter(), log::LevelFilter::Info);
    }
}
