//! # millkit CAM Tools
//!
//! Toolpath and calibration sequence generators.
//!
//! - Raster and diagonal top surfacing
//! - Single-edge milling along X or Y
//! - Peck drill cycle
//! - Probe-based calibration of the tool-change and milling frames
//! - Jog-to-corner helper for checking scanned program extents
//!
//! Generators write command batches derived from [`MillingParameters`] into
//! a [`PathWriter`]: either a [`Toolpath`] for inspection, or a
//! [`SinkWriter`] streaming each batch to a
//! [`CommandSink`](millkit_core::CommandSink) as it is produced.

pub mod calibration;
pub mod corner_jog;
pub mod diagonal_top;
pub mod drill_cycle;
pub mod edge_mill;
pub mod error;
pub mod pacing;
pub mod raster_top;
pub mod toolpath;

pub use calibration::{CalibrationReport, CalibrationSequencer, CalibrationSettings, ProbeBlock};
pub use corner_jog::{CornerJog, JogTick, OperatorInput};
pub use diagonal_top::{DiagonalSweep, DiagonalTopGenerator, SweepStep};
pub use drill_cycle::DrillCycleGenerator;
pub use edge_mill::{EdgeAxis, EdgeMillGenerator};
pub use error::{CamToolError, CamToolResult, ParameterError};
pub use pacing::StatusPacer;
pub use raster_top::{RasterGeometry, RasterTopGenerator};
pub use toolpath::{check_finite, PathGenerator, PathWriter, SinkWriter, Toolpath};

pub use millkit_core::MillingParameters;
