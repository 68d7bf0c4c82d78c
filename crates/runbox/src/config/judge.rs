use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::config::ConfigError;
use crate::types::Phase;

/// Placeholder expanded to the language's source file name
pub const FILENAME_PLACEHOLDER: &str = "{filename}";

/// Per-problem settings (`problem_config.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemConfig {
    /// Run-phase wall-clock limit in milliseconds
    pub timeout: u64,

    /// Memory limit in megabytes. Enforced by the isolation layer; the runner
    /// only carries it.
    #[serde(default)]
    pub memory_limit: Option<u64>,

    /// Whether this invocation compiles instead of runs
    #[serde(default)]
    pub is_build: bool,

    /// Per-stream output cap in bytes
    #[serde(default)]
    pub output_limit: Option<u64>,
}

impl ProblemConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.timeout)
    }

    pub fn phase(&self) -> Phase {
        if self.is_build {
            Phase::Build
        } else {
            Phase::Run
        }
    }
}

/// Toolchain settings for the image's language (`language_config.json`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Command that executes the program
    pub run_command: Vec<String>,

    /// Source file name, substituted for `{filename}` in both commands
    #[serde(default)]
    pub filename: SourceFileName,

    /// Interpreted languages have nothing to build
    #[serde(default)]
    pub is_interpreter: bool,

    /// Command that compiles the submission
    #[serde(default)]
    pub build_command: Vec<String>,
}

impl LanguageConfig {
    /// Check if the language has a build step
    pub fn is_compiled(&self) -> bool {
        !self.build_command.is_empty()
    }

    /// Expand `{filename}` in the given command
    pub fn expand_command(command: &[String], filename: &str) -> Vec<String> {
        command
            .iter()
            .map(|arg| arg.replace(FILENAME_PLACEHOLDER, filename))
            .collect()
    }

    /// Run command with placeholders expanded
    pub fn run_command_line(&self) -> Vec<String> {
        Self::expand_command(&self.run_command, self.filename.as_str())
    }

    /// Build command with placeholders expanded
    pub fn build_command_line(&self) -> Result<Vec<String>, ConfigError> {
        if !self.is_compiled() {
            return Err(ConfigError::NotCompiled);
        }
        Ok(Self::expand_command(
            &self.build_command,
            self.filename.as_str(),
        ))
    }
}

/// Bare file name inside the runtime directory (e.g. "main.cpp")
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceFileName(String);

impl SourceFileName {
    pub fn new(name: &str) -> Result<Self, ConfigError> {
        if name.contains('/') || name == "." || name == ".." {
            return Err(ConfigError::InvalidFileName(name.to_owned()));
        }
        Ok(Self(name.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for SourceFileName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SourceFileName::new(&s).map_err(|_| {
            de::Error::invalid_value(
                de::Unexpected::Str(&s),
                &"a bare file name without '/' characters",
            )
        })
    }
}

impl std::fmt::Display for SourceFileName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cpp() -> LanguageConfig {
        LanguageConfig {
            run_command: vec!["./main".to_string()],
            filename: SourceFileName::new("main.cpp").unwrap(),
            is_interpreter: false,
            build_command: vec![
                "g++".to_string(),
                "-O2".to_string(),
                "{filename}".to_string(),
                "-o".to_string(),
                "main".to_string(),
            ],
        }
    }

    #[test]
    fn source_file_name_valid() {
        let name = SourceFileName::new("Main.java").unwrap();
        assert_eq!(name.to_string(), "Main.java");
    }

    #[test]
    fn source_file_name_rejects_slash() {
        assert!(SourceFileName::new("../main.cpp").is_err());
        assert!(SourceFileName::new("src/main.rs").is_err());
    }

    #[test]
    fn source_file_name_rejects_dot_dirs() {
        assert!(SourceFileName::new(".").is_err());
        assert!(SourceFileName::new("..").is_err());
    }

    #[test]
    fn source_file_name_empty_default() {
        assert!(SourceFileName::default().is_empty());
    }

    #[test]
    fn expand_command_replaces_every_placeholder() {
        let command = vec![
            "cp".to_string(),
            "{filename}".to_string(),
            "backup-{filename}".to_string(),
        ];
        let expanded = LanguageConfig::expand_command(&command, "a.py");
        assert_eq!(expanded, vec!["cp", "a.py", "backup-a.py"]);
    }

    #[test]
    fn build_command_line_expands_filename() {
        let line = cpp().build_command_line().unwrap();
        assert_eq!(line, vec!["g++", "-O2", "main.cpp", "-o", "main"]);
    }

    #[test]
    fn build_command_line_for_interpreter_is_an_error() {
        let python = LanguageConfig {
            run_command: vec!["python3".to_string(), "{filename}".to_string()],
            filename: SourceFileName::new("main.py").unwrap(),
            is_interpreter: true,
            build_command: Vec::new(),
        };
        assert!(!python.is_compiled());
        assert!(matches!(
            python.build_command_line(),
            Err(ConfigError::NotCompiled)
        ));
        assert_eq!(python.run_command_line(), vec!["python3", "main.py"]);
    }

    #[test]
    fn problem_phase_and_time_limit() {
        let problem = ProblemConfig {
            timeout: 1500,
            memory_limit: Some(256),
            is_build: false,
            output_limit: None,
        };
        assert_eq!(problem.phase(), Phase::Run);
        assert_eq!(problem.time_limit(), Duration::from_millis(1500));

        let build = ProblemConfig {
            is_build: true,
            ..problem
        };
        assert_eq!(build.phase(), Phase::Build);
    }
}
