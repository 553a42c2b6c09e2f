//! Drill cycle
//!
//! Peck drilling in place: each cycle plunges 3 units at the feed speed,
//! dwells for chip clearance and retracts 2 units. After the last cycle the
//! tool retracts by the total depth gained so it ends where it started.
//! No probe or limit check happens here; overtravel is left to the motion
//! engine's own limits.

use millkit_core::{Command, Directive, DistanceMode, MillingParameters, MotionWords};

use crate::error::CamToolResult;
use crate::toolpath::{check_finite, PathGenerator, PathWriter};

/// Plunge per cycle (mm)
pub const PLUNGE_DEPTH: f64 = 3.0;
/// Retract per cycle (mm)
pub const PECK_RETRACT: f64 = 2.0;
/// Chip clearance dwell per cycle (ms)
pub const CHIP_CLEAR_DWELL_MS: u64 = 100;

/// Generator for the drill cycle
#[derive(Debug, Clone)]
pub struct DrillCycleGenerator {
    params: MillingParameters,
}

impl DrillCycleGenerator {
    /// Create a new generator with the given parameters
    pub fn new(params: MillingParameters) -> Self {
        Self { params }
    }

    /// Net depth reached after all cycles, before the final retract
    pub fn total_depth(&self) -> f64 {
        f64::from(self.params.pass_depth_count) * (PLUNGE_DEPTH - PECK_RETRACT)
    }
}

impl PathGenerator for DrillCycleGenerator {
    fn label(&self) -> &str {
        "Drilling"
    }

    fn write_path<W: PathWriter>(&self, out: &mut W) -> CamToolResult<()> {
        check_finite(&self.params)?;
        out.put(Directive::Distance(DistanceMode::Relative))?;
        for _ in 0..self.params.pass_depth_count {
            out.put(
                Command::single(Directive::linear(
                    MotionWords::new()
                        .z(-PLUNGE_DEPTH)
                        .feed(self.params.feed_speed),
                ))
                .with(Directive::Dwell {
                    millis: CHIP_CLEAR_DWELL_MS,
                })
                .with(Directive::rapid(MotionWords::new().z(PECK_RETRACT))),
            )?;
        }
        out.put(
            Command::single(Directive::rapid(MotionWords::new().z(self.total_depth())))
                .with(Directive::Distance(DistanceMode::Absolute)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_cycle_text() {
        let params = MillingParameters {
            pass_depth_count: 1,
            feed_speed: 120.0,
            ..Default::default()
        };
        let text = DrillCycleGenerator::new(params).generate().unwrap();
        assert_eq!(
            text,
            "G91\nG1 Z-3.000 F120.000\nG4 P100\nG0 Z2.000\nG0 Z1.000\nG90\n"
        );
    }

    #[test]
    fn test_zero_cycles() {
        let params = MillingParameters {
            pass_depth_count: 0,
            ..Default::default()
        };
        let text = DrillCycleGenerator::new(params).generate().unwrap();
        assert_eq!(text, "G91\nG0 Z0.000\nG90\n");
    }
}
