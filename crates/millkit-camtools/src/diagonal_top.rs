//! Diagonal Top Surfacing
//!
//! Mills a rectangle centred on the workspace origin with 45° biased
//! stepping from the `(-w, -h)` corner toward `(w, h)`. Two frontiers track
//! the edges already swept; when the moving point overshoots an extent it
//! is clamped to the boundary and the frontier of the other axis advances
//! instead. Each layer ends back at the observation point the run started
//! from, raised by a fixed clearance.

use serde::{Deserialize, Serialize};

use millkit_core::{
    Command, CommandSink, Directive, DistanceMode, MillingParameters, MotionWords, PositionControl,
    Position,
};

use crate::error::CamToolResult;
use crate::toolpath::{
    check_finite, effective_step, non_negative, PathGenerator, PathWriter, SinkWriter, Toolpath,
};

/// Z clearance above the observation point for returns (mm)
pub const RETURN_CLEARANCE: f64 = 5.0;

/// One iteration of the frontier loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepStep {
    /// X frontier after this iteration
    pub min_x: f64,
    /// Y frontier after this iteration
    pub min_y: f64,
    /// Absolute XY targets visited in this iteration
    pub points: Vec<(f64, f64)>,
}

/// Iterator over the frontier loop of one layer
#[derive(Debug, Clone)]
pub struct DiagonalSweep {
    w: f64,
    h: f64,
    step: f64,
    x: f64,
    y: f64,
    min_x: f64,
    min_y: f64,
    done: bool,
}

impl DiagonalSweep {
    /// Sweep of the rectangle `[-w, w] x [-h, h]` with the given step
    pub fn new(half_width: f64, half_height: f64, step: f64) -> Self {
        let w = non_negative(half_width);
        let h = non_negative(half_height);
        let step = effective_step(step, 2.0 * w.max(h));
        Self {
            w,
            h,
            step,
            x: -w,
            y: -h,
            min_x: -w,
            min_y: -h,
            done: false,
        }
    }

    /// Step actually used after degeneracy handling
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Upper bound on the number of iterations for this geometry
    pub fn max_iterations(&self) -> usize {
        if self.step <= 0.0 {
            return 0;
        }
        (2.0 * (self.w + self.h) / self.step).ceil() as usize + 2
    }
}

impl Iterator for DiagonalSweep {
    type Item = SweepStep;

    fn next(&mut self) -> Option<SweepStep> {
        let (w, h, d) = (self.w, self.h, self.step);
        if self.done || !(self.min_x < w && self.min_y < h) {
            return None;
        }

        self.x += d;
        self.y += d;
        let clamped_y = self.y > h;
        if clamped_y {
            self.min_x += d;
            self.y = h;
        }
        let clamped_x = self.x > w;
        if clamped_x {
            self.x = w;
            self.min_y += d;
        }

        let (x, y, min_x, min_y) = (self.x, self.y, self.min_x, self.min_y);
        let mut points = Vec::with_capacity(4);
        if clamped_x {
            points.push((w, min_y - d));
        } else {
            points.push((x - d, min_y));
        }

        if min_x > w && min_y > h {
            // Both frontiers passed their extents: finish at the far corner
            points.push((w, h));
            self.done = true;
        } else {
            // A frontier may step past its extent on the last pass; keep the
            // tool on the rectangle
            let fx = min_x.min(w);
            let fy = min_y.min(h);
            points.push((x, fy));
            if clamped_y {
                points.push((min_x - d, h));
            } else {
                points.push((fx, y - d));
            }
            points.push((fx, y));
        }

        Some(SweepStep {
            min_x,
            min_y,
            points,
        })
    }
}

/// Generator for diagonal top surfacing
#[derive(Debug, Clone)]
pub struct DiagonalTopGenerator {
    params: MillingParameters,
    origin: Position,
}

impl DiagonalTopGenerator {
    /// Create a new generator observing from the workspace origin
    pub fn new(params: MillingParameters) -> Self {
        Self {
            params,
            origin: Position::default(),
        }
    }

    /// Set the observation point the tool returns to after each layer
    pub fn with_origin(mut self, origin: Position) -> Self {
        self.origin = origin;
        self
    }

    /// Frontier loop for one layer
    pub fn sweep(&self) -> DiagonalSweep {
        DiagonalSweep::new(
            self.params.area_width / 2.0,
            self.params.area_height / 2.0,
            self.params.step_over(),
        )
    }

    /// Plan the toolpath returning to an explicit observation point
    pub fn plan_from(&self, origin: Position) -> CamToolResult<Toolpath> {
        let mut path = Toolpath::new(self.label());
        self.write_from(origin, &mut path)?;
        Ok(path)
    }

    /// Write the toolpath returning to an explicit observation point
    pub fn write_from<W: PathWriter>(&self, origin: Position, out: &mut W) -> CamToolResult<()> {
        check_finite(&self.params)?;
        let feed = self.params.feed_speed;
        let sweep = self.sweep();
        let w = sweep.w;
        let h = sweep.h;
        let clearance = origin.z + RETURN_CLEARANCE;
        tracing::debug!(
            "Diagonal surfacing: w={:.3} h={:.3} step={:.3} layers={} return={}",
            w,
            h,
            sweep.step(),
            self.params.pass_depth_count,
            origin
        );

        out.put(Directive::Distance(DistanceMode::Absolute))?;
        for layer in 1..=self.params.pass_depth_count {
            out.put(
                Command::single(Directive::rapid(MotionWords::new().z(clearance)))
                    .with(Directive::rapid(MotionWords::new().x(-w).y(-h)))
                    .with(Directive::linear(
                        MotionWords::new().z(-f64::from(layer)).feed(feed),
                    )),
            )?;
            for step in sweep.clone() {
                out.put(
                    step.points
                        .iter()
                        .map(|&(x, y)| Directive::linear(MotionWords::new().x(x).y(y)))
                        .collect::<Command>(),
                )?;
            }
            out.put(
                Command::single(Directive::rapid(MotionWords::new().z(clearance))).with(
                    Directive::rapid(MotionWords::new().x(origin.x).y(origin.y)),
                ),
            )?;
        }
        Ok(())
    }

    /// Run against a live machine
    ///
    /// Waits for queued motion to drain, then reads the authoritative
    /// position as the observation point.
    pub fn run_on<M: CommandSink + PositionControl + ?Sized>(
        &self,
        machine: &mut M,
    ) -> CamToolResult<()> {
        machine.wait_for_idle()?;
        let origin = machine.current_position();
        let mut writer = SinkWriter::start(self.label(), machine);
        self.write_from(origin, &mut writer)?;
        writer.finish();
        Ok(())
    }
}

impl PathGenerator for DiagonalTopGenerator {
    fn label(&self) -> &str {
        "Diagonal surfacing"
    }

    fn write_path<W: PathWriter>(&self, out: &mut W) -> CamToolResult<()> {
        self.write_from(self.origin, out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frontiers_cover_square() {
        let steps: Vec<_> = DiagonalSweep::new(2.0, 2.0, 1.0).collect();
        assert!(!steps.is_empty());
        let last = steps.last().unwrap();
        assert!(last.min_x >= 2.0 || last.min_y >= 2.0);
        assert_eq!(*last.points.last().unwrap(), (2.0, 2.0));
    }

    #[test]
    fn test_first_iteration_points() {
        let mut sweep = DiagonalSweep::new(2.0, 2.0, 1.0);
        let first = sweep.next().unwrap();
        assert_eq!(first.min_x, -2.0);
        assert_eq!(first.min_y, -2.0);
        assert_eq!(
            first.points,
            vec![(-2.0, -2.0), (-1.0, -2.0), (-2.0, -2.0), (-2.0, -1.0)]
        );
    }

    #[test]
    fn test_degenerate_area_yields_nothing() {
        assert_eq!(DiagonalSweep::new(0.0, 0.0, 1.0).count(), 0);
        assert_eq!(DiagonalSweep::new(-4.0, 3.0, 1.0).count(), 0);
    }

    #[test]
    fn test_zero_step_is_single_sweep() {
        let sweep = DiagonalSweep::new(5.0, 3.0, 0.0);
        assert_eq!(sweep.step(), 10.0);
        assert!(sweep.count() <= 3);
    }

    #[test]
    fn test_layer_returns_to_observation_point() {
        let params = MillingParameters {
            area_width: 4.0,
            area_height: 4.0,
            tool_diameter: 2.0,
            pass_depth_count: 2,
            overlap_fraction: 0.5,
            feed_speed: 250.0,
        };
        let gen = DiagonalTopGenerator::new(params).with_origin(Position::new(7.0, 8.0, 1.0));
        let text = gen.generate().unwrap();
        let lines: Vec<_> = text.lines().collect();

        assert_eq!(lines[0], "G90");
        assert_eq!(lines[1], "G0 Z6.000");
        assert_eq!(lines[2], "G0 X-2.000 Y-2.000");
        assert_eq!(lines[3], "G1 Z-1.000 F250.000");
        assert!(lines.contains(&"G1 Z-2.000 F250.000"));
        assert_eq!(lines[lines.len() - 1], "G0 X7.000 Y8.000");
        assert_eq!(
            lines.iter().filter(|l| **l == "G0 X7.000 Y8.000").count(),
            2
        );
    }
}
