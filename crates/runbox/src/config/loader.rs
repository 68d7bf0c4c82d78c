//! Configuration file loading
//!
//! Runner settings are TOML; the judge's problem and language files are JSON.
//! All three go through the config crate and are validated after parsing.

use std::path::Path;

use config::{Config as ConfigBuilder, File, FileFormat};
use serde::de::DeserializeOwned;

use crate::config::{ConfigError, LanguageConfig, ProblemConfig, RunnerSettings};

fn load<T: DeserializeOwned>(path: &Path, format: FileFormat) -> Result<T, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let config = ConfigBuilder::builder()
        .add_source(File::from(path).format(format))
        .build()?;
    Ok(config.try_deserialize()?)
}

fn parse<T: DeserializeOwned>(content: &str, format: FileFormat) -> Result<T, ConfigError> {
    let config = ConfigBuilder::builder()
        .add_source(File::from_str(content, format))
        .build()?;
    Ok(config.try_deserialize()?)
}

impl RunnerSettings {
    /// Load settings from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings: RunnerSettings = load(path.as_ref(), FileFormat::Toml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parse settings from a TOML string
    pub fn parse_toml(content: &str) -> Result<Self, ConfigError> {
        let settings: RunnerSettings = parse(content, FileFormat::Toml)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.output_limit == 0 {
            return Err(ConfigError::Invalid(
                "output_limit must be greater than zero".to_string(),
            ));
        }
        if self.build_time_limit_ms == 0 {
            return Err(ConfigError::Invalid(
                "build_time_limit_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProblemConfig {
    /// Load `problem_config.json`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let problem: ProblemConfig = load(path.as_ref(), FileFormat::Json)?;
        problem.validate()?;
        Ok(problem)
    }

    pub fn parse_json(content: &str) -> Result<Self, ConfigError> {
        let problem: ProblemConfig = parse(content, FileFormat::Json)?;
        problem.validate()?;
        Ok(problem)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_build && self.timeout == 0 {
            return Err(ConfigError::Invalid(
                "timeout must be greater than zero".to_string(),
            ));
        }
        if self.output_limit == Some(0) {
            return Err(ConfigError::Invalid(
                "output_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl LanguageConfig {
    /// Load `language_config.json`
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let language: LanguageConfig = load(path.as_ref(), FileFormat::Json)?;
        language.validate()?;
        Ok(language)
    }

    pub fn parse_json(content: &str) -> Result<Self, ConfigError> {
        let language: LanguageConfig = parse(content, FileFormat::Json)?;
        language.validate()?;
        Ok(language)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.run_command.is_empty() {
            return Err(ConfigError::Invalid("run_command is empty".to_string()));
        }
        if !self.is_interpreter && self.build_command.is_empty() {
            return Err(ConfigError::Invalid(
                "compiled language has an empty build_command".to_string(),
            ));
        }
        Ok(())
    }
}
