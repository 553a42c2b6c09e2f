//! Declared ranges of the live-editable milling parameters
//!
//! The presentation layer binds each numeric field to a range and clamps
//! operator input into it. Generators never clamp: whatever reaches them
//! is used as is.

use serde::Serialize;

use millkit_core::MillingParameters;

use crate::config::MachineSettings;
use crate::error::{ConfigError, ConfigResult};

/// Maximum number of depth layers / drill cycles
pub const MAX_DEPTH_COUNT: u32 = 30;
/// Lowest milling feed accepted (mm/min)
pub const MIN_MILLING_SPEED: f64 = 10.0;
/// Lowest drilling feed accepted (mm/min)
pub const MIN_DRILLING_SPEED: f64 = 1.0;
/// Accepted Z probe offset (mm)
pub const Z_PROBE_OFFSET_RANGE: (f64, f64) = (-50.0, 50.0);

/// Closed numeric range bound to one parameter
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterRange {
    /// Dotted key of the bound field
    pub key: &'static str,
    /// Lowest accepted value
    pub min: f64,
    /// Highest accepted value
    pub max: f64,
}

impl ParameterRange {
    /// Create a range
    pub const fn new(key: &'static str, min: f64, max: f64) -> Self {
        Self { key, min, max }
    }

    /// Whether a value lies inside the range
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamp a value into the range; NaN maps to the minimum
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.min
        } else {
            value.max(self.min).min(self.max)
        }
    }

    /// Error unless the value lies inside the range
    pub fn check(&self, value: f64) -> ConfigResult<()> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(ConfigError::ValueOutOfRange {
                key: self.key.to_string(),
                value: value.to_string(),
            })
        }
    }
}

/// Ranges for every editable milling field, derived from the machine limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterBindings {
    /// Tool diameter: 0..max tool diameter
    pub tool_diameter: ParameterRange,
    /// Depth layers / drill cycles: 0..30
    pub depth: ParameterRange,
    /// Milling feed: 10..max milling speed
    pub milling_speed: ParameterRange,
    /// Drilling feed: 1..max drilling speed
    pub drilling_speed: ParameterRange,
    /// Overlap in percent: 1..100
    pub overlap_percent: ParameterRange,
    /// Area width: 0..bed width
    pub area_width: ParameterRange,
    /// Area height: 0..bed height
    pub area_height: ParameterRange,
    /// Z probe offset: -50..50
    pub z_probe_offset: ParameterRange,
}

impl ParameterBindings {
    /// Derive the bindings from machine limits
    pub fn from_machine(machine: &MachineSettings) -> Self {
        Self {
            tool_diameter: ParameterRange::new(
                "milling.tool_diameter",
                0.0,
                machine.max_tool_diameter,
            ),
            depth: ParameterRange::new("milling.pass_depth_count", 0.0, f64::from(MAX_DEPTH_COUNT)),
            milling_speed: ParameterRange::new(
                "milling.feed_speed",
                MIN_MILLING_SPEED,
                machine.max_milling_speed,
            ),
            drilling_speed: ParameterRange::new(
                "milling.feed_speed",
                MIN_DRILLING_SPEED,
                machine.max_drilling_speed,
            ),
            overlap_percent: ParameterRange::new("milling.overlap_fraction", 1.0, 100.0),
            area_width: ParameterRange::new("milling.area_width", 0.0, machine.bed_width),
            area_height: ParameterRange::new("milling.area_height", 0.0, machine.bed_height),
            z_probe_offset: ParameterRange::new(
                "probing.z_probe_offset",
                Z_PROBE_OFFSET_RANGE.0,
                Z_PROBE_OFFSET_RANGE.1,
            ),
        }
    }

    /// Every binding, for listing in a parameter screen
    pub fn all(&self) -> [ParameterRange; 8] {
        [
            self.tool_diameter,
            self.depth,
            self.milling_speed,
            self.drilling_speed,
            self.overlap_percent,
            self.area_width,
            self.area_height,
            self.z_probe_offset,
        ]
    }

    fn clamp_geometry(&self, params: &MillingParameters) -> MillingParameters {
        MillingParameters {
            area_width: self.area_width.clamp(params.area_width),
            area_height: self.area_height.clamp(params.area_height),
            tool_diameter: self.tool_diameter.clamp(params.tool_diameter),
            pass_depth_count: params.pass_depth_count.min(MAX_DEPTH_COUNT),
            overlap_fraction: self.overlap_percent.clamp(params.overlap_percent()) / 100.0,
            feed_speed: params.feed_speed,
        }
    }

    /// Clamp parameters for a milling operation
    pub fn clamp_milling(&self, params: &MillingParameters) -> MillingParameters {
        let mut clamped = self.clamp_geometry(params);
        clamped.feed_speed = self.milling_speed.clamp(params.feed_speed);
        clamped
    }

    /// Clamp parameters for the drill cycle
    pub fn clamp_drilling(&self, params: &MillingParameters) -> MillingParameters {
        let mut clamped = self.clamp_geometry(params);
        clamped.feed_speed = self.drilling_speed.clamp(params.feed_speed);
        clamped
    }

    /// Check stored milling parameters against the bindings
    pub fn check_milling(&self, params: &MillingParameters) -> ConfigResult<()> {
        self.area_width.check(params.area_width)?;
        self.area_height.check(params.area_height)?;
        self.tool_diameter.check(params.tool_diameter)?;
        self.depth.check(f64::from(params.pass_depth_count))?;
        self.overlap_percent.check(params.overlap_percent())?;
        self.milling_speed.check(params.feed_speed)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_clamp() {
        let range = ParameterRange::new("x", 0.0, 10.0);
        assert_eq!(range.clamp(-1.0), 0.0);
        assert_eq!(range.clamp(11.0), 10.0);
        assert_eq!(range.clamp(5.5), 5.5);
        assert_eq!(range.clamp(f64::NAN), 0.0);
        assert!(range.check(10.0).is_ok());
        assert!(range.check(10.5).is_err());
    }

    #[test]
    fn test_clamp_milling_and_drilling() {
        let bindings = ParameterBindings::from_machine(&MachineSettings::default());
        let params = MillingParameters {
            area_width: 500.0,
            area_height: -4.0,
            tool_diameter: 25.0,
            pass_depth_count: 99,
            overlap_fraction: 0.001,
            feed_speed: 5000.0,
        };

        let milling = bindings.clamp_milling(&params);
        assert_eq!(milling.area_width, 200.0);
        assert_eq!(milling.area_height, 0.0);
        assert_eq!(milling.tool_diameter, 10.0);
        assert_eq!(milling.pass_depth_count, 30);
        assert_eq!(milling.overlap_fraction, 0.01);
        assert_eq!(milling.feed_speed, 1000.0);

        let drilling = bindings.clamp_drilling(&params);
        assert_eq!(drilling.feed_speed, 300.0);
    }

    #[test]
    fn test_check_milling() {
        let bindings = ParameterBindings::from_machine(&MachineSettings::default());
        assert!(bindings.check_milling(&MillingParameters::default()).is_ok());

        let params = MillingParameters {
            tool_diameter: 12.0,
            ..Default::default()
        };
        assert_eq!(
            bindings.check_milling(&params),
            Err(ConfigError::ValueOutOfRange {
                key: "milling.tool_diameter".to_string(),
                value: "12".to_string(),
            })
        );
    }
}
