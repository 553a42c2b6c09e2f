//! Error types for the CAM tools crate.
//!
//! Range violations never error here: out-of-range geometry degenerates to
//! short or empty sweeps. Only values that cannot produce a terminating
//! toolpath (NaN, infinities) and failures reported by the machine are
//! surfaced.

use thiserror::Error;

/// Errors that can occur while planning or running a CAM operation.
#[derive(Error, Debug)]
pub enum CamToolError {
    /// Invalid parameters were provided to a CAM tool.
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// The machine rejected a command or a position update.
    #[error("Machine error: {0}")]
    Machine(#[from] millkit_core::Error),

    /// A parameter validation error occurred.
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParameterError),
}

/// Errors related to CAM tool parameter validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter is NaN or infinite.
    #[error("Parameter '{name}' is not a finite number")]
    NotFinite { name: String },
}

/// Result type for CAM tool operations.
pub type CamToolResult<T> = Result<T, CamToolError>;

impl CamToolError {
    /// Check if this error came from the machine.
    pub fn is_machine_error(&self) -> bool {
        matches!(self, CamToolError::Machine(_))
    }

    /// Check if this is a parameter error.
    pub fn is_parameter_error(&self) -> bool {
        matches!(self, CamToolError::Parameter(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use millkit_core::{Axis, ControllerError};

    #[test]
    fn test_parameter_error_display() {
        let err = ParameterError::NotFinite {
            name: "feed_speed".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'feed_speed' is not a finite number"
        );
    }

    #[test]
    fn test_machine_error_conversion() {
        let core: millkit_core::Error = ControllerError::PositionWriteFailed {
            axis: Axis::X,
            reason: "busy".to_string(),
        }
        .into();
        let err: CamToolError = core.into();
        assert!(err.is_machine_error());
        assert!(!err.is_parameter_error());
    }
}
