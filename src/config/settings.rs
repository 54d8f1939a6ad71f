//! TOML-based configuration for the cohort compiler.
//!
//! Supports a config file (cohort.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [compiler]
//! app_db = "${LEAF_APP_DB}"
//! field_person_id = "PersonId"
//! field_encounter_id = "EncounterId"
//! alias = "@"
//! dialect = "tsql"
//! timeout_seconds = 180
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::Dialect;
use crate::validation::is_qualified_identifier;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Compiler options.
    pub compiler: CompilerOptions,

    /// Logging configuration.
    pub logging: LoggingSettings,
}

/// Process-wide compiler configuration. Read-only to the compilers.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Database holding the application schema (`{app_db}.app.Cohort`).
    /// Supports ${ENV_VAR} expansion.
    pub app_db: String,

    /// Person id column name in warehouse tables and panel SQL.
    pub field_person_id: String,

    /// Encounter id column name in warehouse tables and panel SQL.
    pub field_encounter_id: String,

    /// Placeholder that concept fragments use for their table alias.
    pub alias: String,

    /// Target SQL dialect.
    pub dialect: Dialect,

    /// Execution timeout handed to the query runner.
    pub timeout_seconds: u64,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            app_db: "LeafDB".to_string(),
            field_person_id: "PersonId".to_string(),
            field_encounter_id: "EncounterId".to_string(),
            alias: "@".to_string(),
            dialect: Dialect::default(),
            timeout_seconds: 180,
        }
    }
}

impl CompilerOptions {
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_app_db(mut self, app_db: &str) -> Self {
        self.app_db = app_db.into();
        self
    }

    /// `{app_db}.app.Cohort` as path segments.
    pub fn cohort_table(&self) -> Vec<&str> {
        let mut parts: Vec<&str> = self.app_db.split('.').collect();
        parts.extend(["app", "Cohort"]);
        parts
    }

    /// Check that every name spliced into SQL is a plain identifier.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !is_qualified_identifier(&self.app_db) {
            return Err(SettingsError::InvalidConfig(format!(
                "app_db {:?} is not a database name",
                self.app_db
            )));
        }
        for (key, value) in [
            ("field_person_id", &self.field_person_id),
            ("field_encounter_id", &self.field_encounter_id),
        ] {
            if crate::validation::validate_identifier(value).is_err() {
                return Err(SettingsError::InvalidConfig(format!(
                    "{} {:?} is not a column name",
                    key, value
                )));
            }
        }
        if self.alias.is_empty() || self.alias.chars().any(char::is_whitespace) {
            return Err(SettingsError::InvalidConfig(format!(
                "alias {:?} must be a non-empty token",
                self.alias
            )));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive; `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Parse settings from TOML text, expanding environment variables and
    /// validating compiler options.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let mut settings: Settings = toml::from_str(content)?;
        settings.compiler.app_db = expand_env_vars(&settings.compiler.app_db)?;
        settings.compiler.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `COHORT_CONFIG`
    /// 2. `./cohort.toml`
    /// 3. `~/.config/cohort/cohort.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("COHORT_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("cohort.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("cohort").join("cohort.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            let name: String = std::iter::from_fn(|| chars.next_if(|&ch| ch != '}')).collect();
            chars.next(); // consume '}'
            name
        } else {
            std::iter::from_fn(|| chars.next_if(|&ch| ch.is_alphanumeric() || ch == '_'))
                .collect()
        };

        if var_name.is_empty() {
            // Just a lone $, keep it
            result.push('$');
            continue;
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
