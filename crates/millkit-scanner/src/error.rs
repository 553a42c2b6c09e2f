//! Error types for the scanner crate.
//!
//! Only failing to open a program is an error. A read failure part way
//! through a scan ends the scan and is recorded in the report instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur before a scan starts.
#[derive(Error, Debug)]
pub enum ScanError {
    /// The program file could not be opened.
    #[error("Failed to open {path}: {source}")]
    Open {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Result type for scanner operations.
pub type ScanResult<T> = Result<T, ScanError>;
