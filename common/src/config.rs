use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::camera::CameraSelector;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub job: JobConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One extraction job. Immutable for the run.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub source: PathBuf,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub camera: CameraSelector,
    /// Hard cap on decoded records; `None` reads the whole source.
    #[serde(default)]
    pub max_frames: Option<u64>,
    #[serde(default)]
    pub mode: RunMode,
    #[serde(default = "default_inspect_frames")]
    pub inspect_frames: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Extract,
    Inspect,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: default_jpeg_quality(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.job.max_frames == Some(0) {
            return Err(ConfigError::Invalid(
                "job.max_frames must be at least 1 (omit it for no cap)".into(),
            ));
        }
        if self.job.mode == RunMode::Inspect && self.job.inspect_frames == 0 {
            return Err(ConfigError::Invalid(
                "job.inspect_frames must be at least 1".into(),
            ));
        }
        if !(1..=100).contains(&self.output.jpeg_quality) {
            return Err(ConfigError::Invalid(format!(
                "output.jpeg_quality must be within 1..=100, got {}",
                self.output.jpeg_quality
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

fn default_inspect_frames() -> u64 {
    1
}
fn default_jpeg_quality() -> u8 {
    95
}
fn default_log_level() -> String {
    "info".into()
}
