//! Structured command builder
//!
//! Commands are built as typed directives (axis words with optional values,
//! optional feed) and rendered to the motion engine's text syntax only when
//! they cross the [`CommandSink`](crate::machine::CommandSink) boundary.
//! No fixed-size text buffers are involved at any point.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::data::{Axis, Workspace};

/// Macro slot that holds the move-to-tool-change-position sequence (`M810`)
pub const TOOL_CHANGE_MACRO_SLOT: u8 = 0;

/// Distance mode (G90 / G91)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMode {
    /// Absolute positioning (G90)
    Absolute,
    /// Relative positioning (G91)
    Relative,
}

impl DistanceMode {
    /// The G-code that selects this mode
    pub fn gcode(self) -> &'static str {
        match self {
            DistanceMode::Absolute => "G90",
            DistanceMode::Relative => "G91",
        }
    }
}

/// Axis words and feed rate attached to a motion directive
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionWords {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    feed: Option<f64>,
}

impl MotionWords {
    /// Create an empty word set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the X word
    pub fn x(mut self, value: f64) -> Self {
        self.x = Some(value);
        self
    }

    /// Set the Y word
    pub fn y(mut self, value: f64) -> Self {
        self.y = Some(value);
        self
    }

    /// Set the Z word
    pub fn z(mut self, value: f64) -> Self {
        self.z = Some(value);
        self
    }

    /// Set the word for an arbitrary axis
    pub fn axis(self, axis: Axis, value: f64) -> Self {
        match axis {
            Axis::X => self.x(value),
            Axis::Y => self.y(value),
            Axis::Z => self.z(value),
        }
    }

    /// Set the feed rate word
    pub fn feed(mut self, rate: f64) -> Self {
        self.feed = Some(rate);
        self
    }

    /// Value of an axis word, if present
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    /// Feed rate word, if present
    pub fn feed_rate(&self) -> Option<f64> {
        self.feed
    }

    /// Axis words present, in X, Y, Z order
    pub fn axes(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        Axis::ALL
            .into_iter()
            .filter_map(move |axis| self.get(axis).map(|v| (axis, v)))
    }

    /// Whether neither axis nor feed words are present
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.z.is_none() && self.feed.is_none()
    }
}

impl fmt::Display for MotionWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (axis, value) in self.axes() {
            write!(f, " {}{}", axis.letter(), format_value(value))?;
        }
        if let Some(feed) = self.feed {
            write!(f, " F{}", format_value(feed))?;
        }
        Ok(())
    }
}

/// One motion or coordinate-system directive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    /// Rapid move (G0)
    Rapid(MotionWords),
    /// Linear feed move (G1)
    Linear(MotionWords),
    /// Probe toward a surface, stopping on contact (G38.2)
    Probe(MotionWords),
    /// Redefine the current logical position (G92)
    SetPosition(MotionWords),
    /// Switch distance mode (G90 / G91)
    Distance(DistanceMode),
    /// Select a workspace (G54..G56)
    SelectWorkspace(Workspace),
    /// Dwell for a number of milliseconds (G4 P)
    Dwell {
        /// Pause length in milliseconds.
        millis: u64,
    },
    /// Wait for queued moves to finish (M400)
    WaitForMoves,
    /// Audible completion signal (M300)
    Beep,
    /// Disable stepper drivers, all or one axis (M84)
    DisableSteppers(Option<Axis>),
    /// Define a macro in one of the M810..M819 slots
    DefineMacro {
        /// Slot number, 0..=9.
        slot: u8,
        /// Directives run when the macro is invoked.
        body: Vec<Directive>,
    },
    /// Invoke a previously defined macro
    RunMacro {
        /// Slot number, 0..=9.
        slot: u8,
    },
}

impl Directive {
    /// Rapid move (G0)
    pub fn rapid(words: MotionWords) -> Self {
        Directive::Rapid(words)
    }

    /// Linear feed move (G1)
    pub fn linear(words: MotionWords) -> Self {
        Directive::Linear(words)
    }

    /// Probe toward a surface (G38.2)
    pub fn probe(words: MotionWords) -> Self {
        Directive::Probe(words)
    }

    /// Redefine the current position (G92)
    pub fn set_position(words: MotionWords) -> Self {
        Directive::SetPosition(words)
    }

    /// Whether this directive moves the tool
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            Directive::Rapid(_) | Directive::Linear(_) | Directive::Probe(_)
        )
    }

    /// Motion words carried by this directive, if any
    pub fn words(&self) -> Option<&MotionWords> {
        match self {
            Directive::Rapid(w)
            | Directive::Linear(w)
            | Directive::Probe(w)
            | Directive::SetPosition(w) => Some(w),
            _ => None,
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Rapid(w) => write!(f, "G0{}", w),
            Directive::Linear(w) => write!(f, "G1{}", w),
            Directive::Probe(w) => write!(f, "G38.2{}", w),
            Directive::SetPosition(w) => write!(f, "G92{}", w),
            Directive::Distance(mode) => write!(f, "{}", mode.gcode()),
            Directive::SelectWorkspace(ws) => write!(f, "{}", ws.gcode()),
            Directive::Dwell { millis } => write!(f, "G4 P{}", millis),
            Directive::WaitForMoves => write!(f, "M400"),
            Directive::Beep => write!(f, "M300"),
            Directive::DisableSteppers(None) => write!(f, "M84"),
            Directive::DisableSteppers(Some(axis)) => write!(f, "M84 {}", axis.letter()),
            Directive::DefineMacro { slot, body } => {
                // Macro bodies use '|' as the line separator
                write!(f, "M{}", 810 + u16::from(*slot))?;
                for (i, directive) in body.iter().enumerate() {
                    let sep = if i == 0 { ' ' } else { '|' };
                    write!(f, "{}{}", sep, directive)?;
                }
                Ok(())
            }
            Directive::RunMacro { slot } => write!(f, "M{}", 810 + u16::from(*slot)),
        }
    }
}

/// An ordered batch of directives submitted to the motion engine together
///
/// Renders as one directive per line, joined with `\n`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Command {
    directives: Vec<Directive>,
}

impl Command {
    /// Create an empty command
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a command holding one directive
    pub fn single(directive: Directive) -> Self {
        Self {
            directives: vec![directive],
        }
    }

    /// Append a directive, builder style
    pub fn with(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }

    /// Append a directive
    pub fn push(&mut self, directive: Directive) {
        self.directives.push(directive);
    }

    /// The directives in submission order
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Number of directives
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// Whether the command holds no directives
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

impl From<Directive> for Command {
    fn from(directive: Directive) -> Self {
        Command::single(directive)
    }
}

impl FromIterator<Directive> for Command {
    fn from_iter<I: IntoIterator<Item = Directive>>(iter: I) -> Self {
        Self {
            directives: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, directive) in self.directives.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", directive)?;
        }
        Ok(())
    }
}

/// Format a word value with three decimals, never printing `-0.000`
pub fn format_value(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.3}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_with_feed() {
        let d = Directive::linear(MotionWords::new().x(97.5).feed(300.0));
        assert_eq!(d.to_string(), "G1 X97.500 F300.000");
    }

    #[test]
    fn test_words_render_in_axis_order() {
        let d = Directive::rapid(MotionWords::new().z(5.0).y(-2.0).x(1.0));
        assert_eq!(d.to_string(), "G0 X1.000 Y-2.000 Z5.000");
    }

    #[test]
    fn test_negative_zero_is_normalised() {
        assert_eq!(format_value(-0.0), "0.000");
        assert_eq!(format_value(-0.0004), "0.000");
        assert_eq!(format_value(-1.25), "-1.250");
    }

    #[test]
    fn test_macro_definition() {
        let d = Directive::DefineMacro {
            slot: TOOL_CHANGE_MACRO_SLOT,
            body: vec![
                Directive::SelectWorkspace(Workspace::ToolChange),
                Directive::rapid(MotionWords::new().z(0.0)),
                Directive::rapid(MotionWords::new().x(0.0).y(0.0)),
            ],
        };
        assert_eq!(d.to_string(), "M810 G55|G0 Z0.000|G0 X0.000 Y0.000");
        assert_eq!(Directive::RunMacro { slot: 0 }.to_string(), "M810");
    }

    #[test]
    fn test_command_batch_joins_lines() {
        let cmd = Command::single(Directive::SelectWorkspace(Workspace::Milling))
            .with(Directive::set_position(MotionWords::new().x(0.0).y(0.0)))
            .with(Directive::Beep);
        assert_eq!(cmd.to_string(), "G56\nG92 X0.000 Y0.000\nM300");
        assert_eq!(cmd.len(), 3);
    }

    #[test]
    fn test_misc_directives() {
        assert_eq!(Directive::Dwell { millis: 100 }.to_string(), "G4 P100");
        assert_eq!(Directive::DisableSteppers(Some(Axis::Z)).to_string(), "M84 Z");
        assert_eq!(Directive::DisableSteppers(None).to_string(), "M84");
        assert_eq!(
            Directive::probe(MotionWords::new().z(-10.0)).to_string(),
            "G38.2 Z-10.000"
        );
    }
}
