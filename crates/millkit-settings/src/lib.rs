//! millkit Settings Crate
//!
//! Handles application configuration, its persistence as TOML or JSON, and
//! the parameter ranges the presentation layer clamps operator input into.

pub mod config;
pub mod error;
pub mod ranges;

pub use config::{
    Config, MachineSettings, ProbeBlockSettings, ProbingSettings, ScannerSettings,
    APP_DIR_NAME, CONFIG_FILE_NAME,
};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
pub use ranges::{ParameterBindings, ParameterRange, MAX_DEPTH_COUNT};
