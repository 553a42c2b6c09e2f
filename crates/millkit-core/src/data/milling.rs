//! Milling parameters
//!
//! The geometry, tool and feed values a generation run reads. The
//! presentation layer owns an instance and lends it to a generator for the
//! duration of one run.

use serde::{Deserialize, Serialize};

/// Parameters shared by every path generator
///
/// `tool_diameter <= min(area_width, area_height)` is expected for sane
/// coverage but not enforced: out-of-range geometry collapses to a single
/// swept line instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MillingParameters {
    /// Width of the area to mill along X (mm)
    pub area_width: f64,
    /// Height of the area to mill along Y (mm)
    pub area_height: f64,
    /// Diameter of the cutter (mm)
    pub tool_diameter: f64,
    /// Number of one-unit depth layers (or drill cycles)
    pub pass_depth_count: u32,
    /// Row pitch as a fraction of the tool diameter, in (0, 1]
    pub overlap_fraction: f64,
    /// Feed rate for cutting moves (mm/min)
    pub feed_speed: f64,
}

impl Default for MillingParameters {
    fn default() -> Self {
        Self {
            area_width: 100.0,
            area_height: 100.0,
            tool_diameter: 3.0,
            pass_depth_count: 1,
            overlap_fraction: 0.5,
            feed_speed: 300.0,
        }
    }
}

impl MillingParameters {
    /// Half the tool diameter
    pub fn tool_radius(&self) -> f64 {
        self.tool_diameter / 2.0
    }

    /// Distance between adjacent passes: `overlap_fraction * tool_diameter`
    pub fn step_over(&self) -> f64 {
        self.overlap_fraction * self.tool_diameter
    }

    /// Overlap expressed as a whole percentage
    pub fn overlap_percent(&self) -> f64 {
        self.overlap_fraction * 100.0
    }

    /// Return the name of the first non-finite field, if any
    pub fn first_non_finite(&self) -> Option<&'static str> {
        [
            ("area_width", self.area_width),
            ("area_height", self.area_height),
            ("tool_diameter", self.tool_diameter),
            ("overlap_fraction", self.overlap_fraction),
            ("feed_speed", self.feed_speed),
        ]
        .into_iter()
        .find(|(_, value)| !value.is_finite())
        .map(|(name, _)| name)
    }
}
