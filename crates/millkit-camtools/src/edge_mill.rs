//! Edge milling along X or Y
//!
//! Each pass cuts the edge forward while dropping one depth unit, then
//! returns along the same line without further Z change.

use serde::{Deserialize, Serialize};

use millkit_core::{Axis, Command, Directive, DistanceMode, MillingParameters, MotionWords};

use crate::error::CamToolResult;
use crate::raster_top::LAYER_DEPTH;
use crate::toolpath::{check_finite, non_negative, PathGenerator, PathWriter};

/// Edge to mill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeAxis {
    /// Edge parallel to X, length `area_width`
    X,
    /// Edge parallel to Y, length `area_height`
    Y,
}

impl EdgeAxis {
    /// Machine axis the cut runs along
    pub fn axis(self) -> Axis {
        match self {
            EdgeAxis::X => Axis::X,
            EdgeAxis::Y => Axis::Y,
        }
    }
}

/// Generator for single-edge milling
#[derive(Debug, Clone)]
pub struct EdgeMillGenerator {
    params: MillingParameters,
    edge: EdgeAxis,
}

impl EdgeMillGenerator {
    /// Create a new generator for one edge
    pub fn new(params: MillingParameters, edge: EdgeAxis) -> Self {
        Self { params, edge }
    }

    /// Length of the cut
    pub fn length(&self) -> f64 {
        non_negative(match self.edge {
            EdgeAxis::X => self.params.area_width,
            EdgeAxis::Y => self.params.area_height,
        })
    }
}

impl PathGenerator for EdgeMillGenerator {
    fn label(&self) -> &str {
        match self.edge {
            EdgeAxis::X => "Edge X",
            EdgeAxis::Y => "Edge Y",
        }
    }

    fn write_path<W: PathWriter>(&self, out: &mut W) -> CamToolResult<()> {
        check_finite(&self.params)?;
        let axis = self.edge.axis();
        let length = self.length();

        // Zero-length move establishes the feed for the whole cut
        out.put(
            Command::single(Directive::Distance(DistanceMode::Relative)).with(Directive::linear(
                MotionWords::new().z(0.0).feed(self.params.feed_speed),
            )),
        )?;
        for _ in 0..self.params.pass_depth_count {
            out.put(
                Command::single(Directive::linear(
                    MotionWords::new().axis(axis, length).z(-LAYER_DEPTH),
                ))
                .with(Directive::linear(MotionWords::new().axis(axis, -length))),
            )?;
        }
        out.put(Directive::Distance(DistanceMode::Absolute))
    }
}
