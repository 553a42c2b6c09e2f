//! Machine capability traits
//!
//! The core never executes motion itself. It talks to the external motion
//! engine through three narrow capabilities:
//! - [`CommandSink`]: submit command text, query queued motion, wait/yield
//! - [`PositionControl`]: reference axes and rewrite logical positions
//! - [`ProbeInput`]: sample the probe pin after a probe move completes
//!
//! [`Machine`] bundles the three for components (calibration, jog) that need
//! all of them.

pub mod virtual_machine;

use std::io::Write;

use crate::command::Command;
use crate::data::{Axis, PinLevel, Position, Workspace};
use crate::error::Result;

/// Status notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// An operation started; the label is suitable for a status line
    Started(String),
    /// An operation finished successfully (success indication)
    Completed(String),
    /// A probe finished without contact; nothing was calibrated
    ProbeMissed(String),
    /// Control returned to the idle/status screen
    ReturnedToStatus,
}

/// Sink for commands bound for the motion engine
///
/// `submit` is a non-blocking enqueue. Only `wait_for_idle` blocks, and
/// implementations are expected to keep servicing background work while
/// they wait.
pub trait CommandSink {
    /// Enqueue command text; one directive per line, `\n`-joined batches allowed
    fn submit(&mut self, text: &str) -> Result<()>;

    /// Whether motion is still queued or executing
    fn is_motion_queued(&self) -> bool;

    /// Block until all queued motion has finished
    fn wait_for_idle(&mut self) -> Result<()>;

    /// Cooperative yield: process pending idle work and refresh status
    fn service_idle(&mut self) {}

    /// Deliver a status notification to the presentation layer
    fn notify(&mut self, _event: StatusEvent) {}

    /// Render a structured command to text and submit it
    fn emit(&mut self, command: &Command) -> Result<()> {
        if command.is_empty() {
            return Ok(());
        }
        let text = command.to_string();
        tracing::debug!(target: "millkit::sink", "{}", text);
        self.submit(&text)
    }
}

impl<S: CommandSink + ?Sized> CommandSink for &mut S {
    fn submit(&mut self, text: &str) -> Result<()> {
        (**self).submit(text)
    }

    fn is_motion_queued(&self) -> bool {
        (**self).is_motion_queued()
    }

    fn wait_for_idle(&mut self) -> Result<()> {
        (**self).wait_for_idle()
    }

    fn service_idle(&mut self) {
        (**self).service_idle()
    }

    fn notify(&mut self, event: StatusEvent) {
        (**self).notify(event)
    }

    fn emit(&mut self, command: &Command) -> Result<()> {
        (**self).emit(command)
    }
}

/// Position and homing capability of the motion engine
pub trait PositionControl {
    /// Energise the driver of an axis so it holds its position
    fn enable_axis(&mut self, _axis: Axis) {}

    /// Mark an axis as referenced (homed) at its current physical position
    fn mark_axis_referenced(&mut self, axis: Axis);

    /// Current logical position of an axis in the active workspace
    fn logical_position(&self, axis: Axis) -> f64;

    /// Overwrite the logical position of an axis without moving it
    fn set_logical_position(&mut self, axis: Axis, value: f64) -> Result<()>;

    /// Re-synchronise the planner with the logical positions
    fn synchronize_planner(&mut self) -> Result<()>;

    /// Workspace currently selected
    fn active_workspace(&self) -> Workspace;

    /// Logical X/Y/Z position in the active workspace
    fn current_position(&self) -> Position {
        Position::new(
            self.logical_position(Axis::X),
            self.logical_position(Axis::Y),
            self.logical_position(Axis::Z),
        )
    }
}

/// Probe input sampled after a probe move has completed
pub trait ProbeInput {
    /// Sample the probe pin level
    fn probe_level(&self) -> Result<PinLevel>;
}

/// Everything the calibration sequencer and the jog helper need
pub trait Machine: CommandSink + PositionControl + ProbeInput {}

impl<T: CommandSink + PositionControl + ProbeInput + ?Sized> Machine for T {}

/// Command sink that writes command text to any `Write`
///
/// Used to produce G-code files or to print a toolpath instead of running
/// it. Nothing is ever queued, so waiting only flushes the writer.
pub struct StreamSink<W: Write> {
    writer: W,
    lines_written: usize,
}

impl<W: Write> StreamSink<W> {
    /// Create a sink over a writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            lines_written: 0,
        }
    }

    /// Number of lines written so far
    pub fn lines_written(&self) -> usize {
        self.lines_written
    }

    /// Consume the sink and return the writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> CommandSink for StreamSink<W> {
    fn submit(&mut self, text: &str) -> Result<()> {
        writeln!(self.writer, "{}", text)?;
        self.lines_written += text.lines().count();
        Ok(())
    }

    fn is_motion_queued(&self) -> bool {
        false
    }

    fn wait_for_idle(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
