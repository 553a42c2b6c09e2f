//! Error handling for millkit
//!
//! Provides error types for the layers the core touches:
//! - Controller errors (motion engine and position capability)
//! - G-Code errors (word parsing)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

use crate::data::Axis;

/// Controller error type
///
/// Represents failures reported by the external motion engine while the core
/// submits commands or rewrites logical positions.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// The logical position of an axis could not be written
    #[error("Failed to set logical position on {axis}: {reason}")]
    PositionWriteFailed {
        /// The axis whose position write failed.
        axis: Axis,
        /// The reason reported by the position capability.
        reason: String,
    },

    /// The planner could not be re-synchronised with the logical position
    #[error("Planner synchronisation failed: {reason}")]
    PlannerSyncFailed {
        /// The reason reported by the motion engine.
        reason: String,
    },
}

/// G-Code error type
///
/// Represents errors produced while reading words out of a command line.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// A word letter was followed by something that is not a number
    #[error("Invalid value for word '{letter}': {value}")]
    InvalidWord {
        /// The word letter.
        letter: char,
        /// The text that failed to parse.
        value: String,
    },
}

/// Main error type for millkit
///
/// A unified error type that can represent any error raised below the
/// generator layer.
#[derive(Error, Debug)]
pub enum Error {
    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a controller error
    pub fn is_controller_error(&self) -> bool {
        matches!(self, Error::Controller(_))
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_error_display() {
        let err = ControllerError::PositionWriteFailed {
            axis: Axis::Y,
            reason: "driver fault".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to set logical position on Y: driver fault"
        );
    }

    #[test]
    fn test_error_classification() {
        let err: Error = ControllerError::PlannerSyncFailed {
            reason: "busy".to_string(),
        }
        .into();
        assert!(err.is_controller_error());
        assert!(!err.is_gcode_error());

        let err: Error = GcodeError::InvalidWord {
            letter: 'X',
            value: "abc".to_string(),
        }
        .into();
        assert!(err.is_gcode_error());
        assert_eq!(err.to_string(), "Invalid value for word 'X': abc");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.to_string(), "I/O error: pipe closed");
    }
}
