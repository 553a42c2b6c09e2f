//! Application configuration
//!
//! Sections:
//! - `machine`: bed size, speed ceilings, probe feeds and probe polarity
//! - `milling`: the milling parameters last used
//! - `probing`: Z probe offset/travel and the optional reference block
//! - `scanner`: program scanner options
//!
//! Files are TOML or JSON, chosen by extension, and validated on load and
//! on save.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use millkit_core::{MillingParameters, PinLevel};

use crate::error::{ConfigError, SettingsError, SettingsResult};
use crate::ranges::ParameterBindings;

/// Directory name under the platform config dir
pub const APP_DIR_NAME: &str = "millkit";
/// Default config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Machine limits and wiring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MachineSettings {
    /// Bed width along X (mm)
    pub bed_width: f64,
    /// Bed height along Y (mm)
    pub bed_height: f64,
    /// Largest tool diameter accepted (mm)
    pub max_tool_diameter: f64,
    /// Feed ceiling for milling (mm/min)
    pub max_milling_speed: f64,
    /// Feed ceiling for drilling (mm/min)
    pub max_drilling_speed: f64,
    /// Homing/probe feed along X (mm/min)
    pub homing_feed_x: f64,
    /// Homing/probe feed along Y (mm/min)
    pub homing_feed_y: f64,
    /// Homing/probe feed along Z (mm/min)
    pub homing_feed_z: f64,
    /// Pin level the probe reads on contact
    pub probe_hit_level: PinLevel,
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self {
            bed_width: 200.0,
            bed_height: 200.0,
            max_tool_diameter: 10.0,
            max_milling_speed: 1000.0,
            max_drilling_speed: 300.0,
            homing_feed_x: 3000.0,
            homing_feed_y: 3000.0,
            homing_feed_z: 240.0,
            probe_hit_level: PinLevel::Low,
        }
    }
}

/// Reference block for locating the tool-change frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeBlockSettings {
    /// Block size along X (mm)
    pub size_x: f64,
    /// Block size along Y (mm)
    pub size_y: f64,
    /// Block height (mm)
    pub size_z: f64,
    /// Travel of each probe move (mm)
    pub probe_travel: f64,
    /// Clearance kept from the block between probes (mm)
    pub side_clearance: f64,
    /// Feed for the return to the new zero (mm/min)
    pub return_feed: f64,
}

impl Default for ProbeBlockSettings {
    fn default() -> Self {
        Self {
            size_x: 35.0,
            size_y: 60.0,
            size_z: 10.0,
            probe_travel: 100.0,
            side_clearance: 10.0,
            return_feed: 200.0,
        }
    }
}

/// Z probing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbingSettings {
    /// Z assigned to the probed surface (mm)
    pub z_probe_offset: f64,
    /// Maximum downward travel of the Z probe (mm)
    pub z_probe_travel: f64,
    /// Absolute Z to retract to after a hit (mm)
    pub retract_clearance: f64,
    /// Reference block; absent disables tool-workspace locate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block: Option<ProbeBlockSettings>,
}

impl Default for ProbingSettings {
    fn default() -> Self {
        Self {
            z_probe_offset: 0.0,
            z_probe_travel: 10.0,
            retract_clearance: 10.0,
            block: None,
        }
    }
}

/// Program scanner options
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Treat `( ... )` as comments
    pub block_comments: bool,
    /// Maximum buffered line length, terminator included
    pub max_line_length: usize,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        Self {
            block_comments: true,
            max_line_length: 96,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Machine limits
    pub machine: MachineSettings,
    /// Milling parameters
    pub milling: MillingParameters,
    /// Probing
    pub probing: ProbingSettings,
    /// Scanner
    pub scanner: ScannerSettings,
}

enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> SettingsResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(other.unwrap_or("none").to_string()).into()),
    }
}

impl Config {
    /// Create a new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config path: `<config dir>/millkit/config.toml`
    pub fn default_path() -> SettingsResult<PathBuf> {
        let mut path = dirs::config_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| {
                SettingsError::ConfigDirectory("no config or home directory".to_string())
            })?;
        path.push(APP_DIR_NAME);
        path.push(CONFIG_FILE_NAME);
        Ok(path)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)
            .map_err(|e| SettingsError::LoadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load config from file, or defaults when it does not exist
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            tracing::info!("No config at {}; using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::ConfigDirectory(e.to_string()))?;
        }
        std::fs::write(path, content)
            .map_err(|e| SettingsError::SaveError(format!("{}: {}", path.display(), e)))?;

        tracing::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Parameter bindings implied by the machine limits
    pub fn bindings(&self) -> ParameterBindings {
        ParameterBindings::from_machine(&self.machine)
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        let m = &self.machine;
        for (key, value) in [
            ("machine.bed_width", m.bed_width),
            ("machine.bed_height", m.bed_height),
            ("machine.max_tool_diameter", m.max_tool_diameter),
            ("machine.homing_feed_x", m.homing_feed_x),
            ("machine.homing_feed_y", m.homing_feed_y),
            ("machine.homing_feed_z", m.homing_feed_z),
            ("probing.z_probe_travel", self.probing.z_probe_travel),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(out_of_range(key, value));
            }
        }
        if m.max_milling_speed < crate::ranges::MIN_MILLING_SPEED {
            return Err(out_of_range("machine.max_milling_speed", m.max_milling_speed));
        }
        if m.max_drilling_speed < crate::ranges::MIN_DRILLING_SPEED {
            return Err(out_of_range(
                "machine.max_drilling_speed",
                m.max_drilling_speed,
            ));
        }

        let bindings = self.bindings();
        bindings.z_probe_offset.check(self.probing.z_probe_offset)?;
        bindings.check_milling(&self.milling)?;

        if let Some(block) = &self.probing.block {
            for (key, value) in [
                ("probing.block.size_x", block.size_x),
                ("probing.block.size_y", block.size_y),
                ("probing.block.size_z", block.size_z),
                ("probing.block.probe_travel", block.probe_travel),
                ("probing.block.return_feed", block.return_feed),
            ] {
                if !(value > 0.0 && value.is_finite()) {
                    return Err(out_of_range(key, value));
                }
            }
        }

        if self.scanner.max_line_length < 2 {
            return Err(ConfigError::ValueOutOfRange {
                key: "scanner.max_line_length".to_string(),
                value: self.scanner.max_line_length.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

fn out_of_range(key: &str, value: f64) -> SettingsError {
    ConfigError::ValueOutOfRange {
        key: key.to_string(),
        value: value.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_probe_offset_out_of_range() {
        let mut config = Config::default();
        config.probing.z_probe_offset = 75.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::ValueOutOfRange { ref key, .. })
                if key == "probing.z_probe_offset"
        ));
    }

    #[test]
    fn test_zero_bed_is_rejected() {
        let mut config = Config::default();
        config.machine.bed_width = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let err = Config::default()
            .save_to_file(Path::new("settings.yaml"))
            .unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Config(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        if let Ok(path) = Config::default_path() {
            assert!(path.ends_with("millkit/config.toml"));
        }
    }
}
