//! # millkit Scanner
//!
//! Streams a stored program file byte by byte, reconstructs its command
//! lines and accumulates the X/Y bounding box of every motion command
//! without executing the program.

pub mod error;
pub mod gcode;
pub mod source;

pub use error::{ScanError, ScanResult};
pub use gcode::{BoundingBoxScanner, ParsedLine, ScanOptions, ScanReport, Word};
pub use source::{ByteSource, ReaderSource, SliceSource};

pub use millkit_core::Extrema;
