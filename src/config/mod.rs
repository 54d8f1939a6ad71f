//! Configuration for the cohort compiler.
//!
//! Handles the `cohort.toml` file, environment variable expansion, and
//! compiler options.

mod settings;

pub use settings::{expand_env_vars, CompilerOptions, LoggingSettings, Settings, SettingsError};
