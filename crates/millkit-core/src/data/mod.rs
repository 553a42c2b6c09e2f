//! Data models for axes, positions, coordinate systems and probing
//!
//! This module provides:
//! - Axis identifiers for the three linear axes
//! - Named workspaces (coordinate systems) used by the milling workflow
//! - Logical positions
//! - Probe pin levels and probe outcomes
//! - Milling parameters and the bounding-box extrema record

pub mod extrema;
pub mod milling;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Linear machine axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    /// X axis
    X,
    /// Y axis
    Y,
    /// Z axis
    Z,
}

impl Axis {
    /// All axes in X, Y, Z order
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The G-code word letter for this axis
    pub fn letter(self) -> char {
        match self {
            Axis::X => 'X',
            Axis::Y => 'Y',
            Axis::Z => 'Z',
        }
    }

    /// Look up an axis from its word letter (case-insensitive)
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            _ => None,
        }
    }

    /// Index into per-axis arrays
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Named coordinate system
///
/// Switching workspace never moves the tool, it only changes which origin
/// logical positions are reported against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Workspace {
    /// Machine-physical workspace (G54)
    Machine,
    /// Tool-change workspace, zeroed by a successful Z probe (G55)
    ToolChange,
    /// Workpiece milling workspace (G56)
    Milling,
}

impl Workspace {
    /// All workspaces in G54..G56 order
    pub const ALL: [Workspace; 3] = [Workspace::Machine, Workspace::ToolChange, Workspace::Milling];

    /// The G-code that selects this workspace
    pub fn gcode(self) -> &'static str {
        match self {
            Workspace::Machine => "G54",
            Workspace::ToolChange => "G55",
            Workspace::Milling => "G56",
        }
    }

    /// Index into per-workspace arrays
    pub fn index(self) -> usize {
        match self {
            Workspace::Machine => 0,
            Workspace::ToolChange => 1,
            Workspace::Milling => 2,
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::Machine
    }
}

impl fmt::Display for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Workspace::Machine => write!(f, "machine (G54)"),
            Workspace::ToolChange => write!(f, "tool change (G55)"),
            Workspace::Milling => write!(f, "milling (G56)"),
        }
    }
}

/// Logical X/Y/Z position in the active workspace
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
}

impl Position {
    /// Create a new position with X, Y, Z coordinates
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Get the coordinate of one axis
    pub fn get(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Set the coordinate of one axis
    pub fn set(&mut self, axis: Axis, value: f64) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "X:{:.3} Y:{:.3} Z:{:.3}", self.x, self.y, self.z)
    }
}

/// Electrical level sampled on the probe input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinLevel {
    /// Logic low
    Low,
    /// Logic high
    High,
}

impl PinLevel {
    /// The opposite level
    pub fn inverted(self) -> Self {
        match self {
            PinLevel::Low => PinLevel::High,
            PinLevel::High => PinLevel::Low,
        }
    }
}

/// Result of a probe-toward-surface motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeOutcome {
    /// The probe touched the surface
    Hit,
    /// The probe travelled its full distance without contact
    Miss,
}

impl ProbeOutcome {
    /// Classify a sampled pin level.
    ///
    /// The probe is a hit if and only if the sampled level equals the
    /// configured hit level. Every other reading is a miss.
    pub fn from_pin(level: PinLevel, hit_level: PinLevel) -> Self {
        if level == hit_level {
            ProbeOutcome::Hit
        } else {
            ProbeOutcome::Miss
        }
    }

    /// Check if the probe touched the surface
    pub fn is_hit(self) -> bool {
        matches!(self, ProbeOutcome::Hit)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Hit => write!(f, "hit"),
            ProbeOutcome::Miss => write!(f, "miss"),
        }
    }
}
