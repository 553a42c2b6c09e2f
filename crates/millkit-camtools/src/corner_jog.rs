//! Jog to the corners of a scanned program
//!
//! After a program has been scanned, the operator can step the tool around
//! the four corners of its bounding box (widened by the tool radius) to
//! check that the stock is large enough. The encoder raises or lowers Z
//! relative to the height the jog started at; a confirm click returns to
//! the origin and ends the loop.

use millkit_core::{CommandSink, Directive, Extrema, MotionWords, StatusEvent};

use crate::error::{CamToolError, CamToolResult};

/// Z change per encoder detent (mm)
pub const Z_STEP_PER_DETENT: f64 = 0.5;

/// Operator input polled once per jog iteration
pub trait OperatorInput {
    /// Encoder detents turned since the last call (signed)
    fn take_encoder_steps(&mut self) -> i32;

    /// Whether the operator confirmed since the last call
    fn take_confirm(&mut self) -> bool;
}

/// What one jog iteration did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JogTick {
    /// Motion is still queued; nothing was sent
    Waiting,
    /// Started the move to the corner with this index
    MovedTo(usize),
    /// Moved Z to this height after encoder input
    AdjustedZ(f64),
    /// Returned to the origin; the loop is over
    Finished,
}

/// Bounded state machine cycling through the four corners
#[derive(Debug, Clone)]
pub struct CornerJog {
    corners: [(f64, f64); 4],
    next: usize,
    z: f64,
    finished: bool,
}

impl CornerJog {
    /// Build the corner cycle from scanned extrema and the tool radius.
    ///
    /// `start_z` is the live Z of the tool; encoder detents move relative
    /// to it.
    pub fn new(extrema: &Extrema, tool_radius: f64, start_z: f64) -> CamToolResult<Self> {
        if !extrema.has_x() || !extrema.has_y() {
            return Err(CamToolError::InvalidParameters(
                "no X/Y extents have been scanned".to_string(),
            ));
        }
        let r = tool_radius;
        Ok(Self {
            corners: [
                (extrema.min_x - r, extrema.min_y - r),
                (extrema.max_x + r, extrema.min_y - r),
                (extrema.max_x + r, extrema.max_y + r),
                (extrema.min_x - r, extrema.max_y + r),
            ],
            next: 0,
            z: start_z,
            finished: false,
        })
    }

    /// The four corners in visiting order
    pub fn corners(&self) -> &[(f64, f64); 4] {
        &self.corners
    }

    /// Current jog height
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Whether the loop has ended
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Run one iteration
    pub fn tick<S, I>(&mut self, sink: &mut S, input: &mut I) -> CamToolResult<JogTick>
    where
        S: CommandSink + ?Sized,
        I: OperatorInput + ?Sized,
    {
        if self.finished {
            return Ok(JogTick::Finished);
        }

        if input.take_confirm() {
            sink.emit(&Directive::rapid(MotionWords::new().x(0.0).y(0.0)).into())?;
            sink.wait_for_idle()?;
            self.finished = true;
            tracing::info!("Corner jog finished");
            sink.notify(StatusEvent::ReturnedToStatus);
            return Ok(JogTick::Finished);
        }

        let steps = input.take_encoder_steps();
        if steps != 0 {
            self.z += f64::from(steps) * Z_STEP_PER_DETENT;
            sink.emit(&Directive::rapid(MotionWords::new().z(self.z)).into())?;
            return Ok(JogTick::AdjustedZ(self.z));
        }

        if sink.is_motion_queued() {
            sink.service_idle();
            return Ok(JogTick::Waiting);
        }

        let index = self.next;
        let (x, y) = self.corners[index];
        sink.emit(&Directive::rapid(MotionWords::new().x(x).y(y)).into())?;
        self.next = (index + 1) % self.corners.len();
        tracing::debug!("Jog to corner {} at X{:.3} Y{:.3}", index, x, y);
        Ok(JogTick::MovedTo(index))
    }

    /// Iterate until the operator confirms; returns the corner moves made
    pub fn run<S, I>(&mut self, sink: &mut S, input: &mut I) -> CamToolResult<usize>
    where
        S: CommandSink + ?Sized,
        I: OperatorInput + ?Sized,
    {
        let mut moves = 0;
        loop {
            match self.tick(sink, input)? {
                JogTick::Finished => return Ok(moves),
                JogTick::MovedTo(_) => moves += 1,
                JogTick::Waiting | JogTick::AdjustedZ(_) => {}
            }
        }
    }
}
