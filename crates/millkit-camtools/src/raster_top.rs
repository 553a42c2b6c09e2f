//! Raster Top Surfacing
//!
//! Mills a rectangle in unit-depth layers with a boustrophedon sweep along
//! X, stepping along Y by `overlap * tool_diameter`. All moves are relative
//! to the start corner; absolute mode is restored at the end.

use serde::{Deserialize, Serialize};

use millkit_core::{Command, Directive, DistanceMode, MillingParameters, MotionWords};

use crate::error::CamToolResult;
use crate::toolpath::{check_finite, effective_step, non_negative, PathGenerator, PathWriter};

/// Depth of one surfacing layer (mm)
pub const LAYER_DEPTH: f64 = 1.0;

/// Effective sweep extents derived from the milling parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterGeometry {
    /// X traverse length: `area_width - tool_radius`
    pub width: f64,
    /// Total Y advance: `area_height - tool_radius`
    pub height: f64,
    /// Row pitch
    pub row_pitch: f64,
}

impl RasterGeometry {
    /// Derive the geometry, clamping degenerate extents to zero
    pub fn from_params(params: &MillingParameters) -> Self {
        let width = non_negative(params.area_width - params.tool_radius());
        let height = non_negative(params.area_height - params.tool_radius());
        Self {
            width,
            height,
            row_pitch: effective_step(params.step_over(), height),
        }
    }

    /// Y steps of one layer; each is the full pitch except the clamped last one
    pub fn row_steps(&self) -> impl Iterator<Item = f64> {
        let (pitch, height) = (self.row_pitch, self.height);
        let mut y = 0.0;
        std::iter::from_fn(move || {
            if y >= height {
                return None;
            }
            let step = pitch.min(height - y);
            y += pitch;
            Some(step)
        })
    }
}

/// Generator for raster top surfacing
#[derive(Debug, Clone)]
pub struct RasterTopGenerator {
    params: MillingParameters,
}

impl RasterTopGenerator {
    /// Create a new generator with the given parameters
    pub fn new(params: MillingParameters) -> Self {
        Self { params }
    }

    /// The derived sweep geometry
    pub fn geometry(&self) -> RasterGeometry {
        RasterGeometry::from_params(&self.params)
    }

    fn write_layer<W: PathWriter>(
        &self,
        out: &mut W,
        layer: u32,
        geometry: &RasterGeometry,
    ) -> CamToolResult<()> {
        let feed = self.params.feed_speed;
        let w = geometry.width;
        let h = geometry.height;

        out.put(Directive::linear(
            MotionWords::new().z(-LAYER_DEPTH).feed(feed),
        ))?;

        let mut steps = geometry.row_steps();
        while let Some(step) = steps.next() {
            out.put(
                Command::single(Directive::linear(MotionWords::new().x(w).feed(feed)))
                    .with(Directive::linear(MotionWords::new().y(step))),
            )?;
            let mut back = Command::single(Directive::linear(MotionWords::new().x(-w)));
            if let Some(step) = steps.next() {
                back.push(Directive::linear(MotionWords::new().y(step)));
            }
            out.put(back)?;
        }

        // Close the margin so the layer ends back at the start corner
        let margin = if layer % 2 == 0 {
            Command::single(Directive::linear(MotionWords::new().x(w)))
                .with(Directive::linear(MotionWords::new().y(-h)))
                .with(Directive::linear(MotionWords::new().x(-w)))
        } else {
            Command::single(Directive::linear(MotionWords::new().y(-h)))
        };
        out.put(margin)
    }
}

impl PathGenerator for RasterTopGenerator {
    fn label(&self) -> &str {
        "Surfacing"
    }

    fn write_path<W: PathWriter>(&self, out: &mut W) -> CamToolResult<()> {
        check_finite(&self.params)?;
        let geometry = self.geometry();
        tracing::debug!(
            "Raster surfacing: w={:.3} h={:.3} pitch={:.3} layers={}",
            geometry.width,
            geometry.height,
            geometry.row_pitch,
            self.params.pass_depth_count
        );

        out.put(Directive::Distance(DistanceMode::Relative))?;
        for layer in 0..self.params.pass_depth_count {
            self.write_layer(out, layer, &geometry)?;
        }
        out.put(Directive::Distance(DistanceMode::Absolute))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(width: f64, height: f64, tool: f64, overlap: f64) -> MillingParameters {
        MillingParameters {
            area_width: width,
            area_height: height,
            tool_diameter: tool,
            pass_depth_count: 1,
            overlap_fraction: overlap,
            feed_speed: 300.0,
        }
    }

    #[test]
    fn test_last_row_step_is_clamped() {
        let geometry = RasterGeometry::from_params(&params(20.0, 11.0, 2.0, 0.5));
        assert_eq!(geometry.height, 10.0);
        assert_eq!(geometry.row_pitch, 1.0);
        assert_eq!(geometry.row_steps().count(), 10);

        let geometry = RasterGeometry::from_params(&params(20.0, 4.5, 2.0, 0.8));
        // h = 3.5, pitch = 1.6 -> 1.6, 1.6, 0.3
        let steps: Vec<f64> = geometry.row_steps().collect();
        assert_eq!(steps.len(), 3);
        assert!((steps[2] - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_single_layer_text() {
        let gen = RasterTopGenerator::new(params(11.0, 3.0, 2.0, 1.0));
        let text = gen.generate().unwrap();
        let expected = "G91\n\
                        G1 Z-1.000 F300.000\n\
                        G1 X10.000 F300.000\n\
                        G1 Y2.000\n\
                        G1 X-10.000\n\
                        G1 X10.000\n\
                        G1 Y-2.000\n\
                        G1 X-10.000\n\
                        G90\n";
        assert_eq!(text, expected);
    }

    #[test]
    fn test_zero_tool_is_single_sweep() {
        let geometry = RasterGeometry::from_params(&params(10.0, 10.0, 0.0, 0.5));
        assert_eq!(geometry.row_steps().collect::<Vec<_>>(), vec![10.0]);
    }

    #[test]
    fn test_oversized_tool_does_not_fail() {
        let gen = RasterTopGenerator::new(params(2.0, 2.0, 10.0, 0.5));
        let geometry = gen.geometry();
        assert_eq!(geometry.width, 0.0);
        assert_eq!(geometry.height, 0.0);
        assert_eq!(geometry.row_steps().next(), None);
        assert!(gen.plan().is_ok());
    }

    #[test]
    fn test_non_finite_is_rejected() {
        let gen = RasterTopGenerator::new(params(f64::NAN, 10.0, 2.0, 0.5));
        assert!(gen.plan().unwrap_err().is_parameter_error());
    }
}
