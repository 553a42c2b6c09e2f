//! # millkit
//!
//! Toolpath and calibration sequence generator for a milling/drilling
//! attachment driven by motion-control firmware.
//!
//! ## Architecture
//!
//! millkit is organized as a workspace with multiple crates:
//!
//! 1. **millkit-core** - Data model, structured commands, machine capability traits
//! 2. **millkit-camtools** - Surfacing, edge, drill, calibration and corner jog sequences
//! 3. **millkit-scanner** - Streaming bounding-box scanner for program files
//! 4. **millkit-settings** - Configuration persistence and parameter ranges
//! 5. **millkit** - Session facade and command-line front end

pub mod session;

pub use millkit_camtools::{
    CalibrationReport, CalibrationSequencer, CalibrationSettings, CamToolError, CornerJog,
    DiagonalTopGenerator, DrillCycleGenerator, EdgeAxis, EdgeMillGenerator, JogTick,
    OperatorInput, PathGenerator, ProbeBlock, RasterTopGenerator, Toolpath,
};
pub use millkit_core::{
    Axis, Command, CommandSink, Directive, Error, Extrema, Machine, MillingParameters, PinLevel,
    Position, PositionControl, ProbeInput, ProbeOutcome, Result, StatusEvent, StreamSink,
    VirtualMachine, Workspace,
};
pub use millkit_scanner::{BoundingBoxScanner, ScanError, ScanOptions, ScanReport};
pub use millkit_settings::{Config, ConfigError, ParameterBindings, SettingsError};
pub use session::{Action, Session, SessionError, SessionResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Initialize logging
///
/// Sets up structured logging with:
/// - Output on stderr, leaving stdout for generated G-code
/// - RUST_LOG environment variable support, falling back to `default_level`
/// - Target, level and line numbers on every event
pub fn init_logging(default_level: tracing::Level, format: LogFormat) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_str().to_ascii_lowercase()));

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Text => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);
            registry.with(fmt_layer).try_init()?;
        }
        LogFormat::Json => {
            let fmt_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .with_line_number(true);
            registry.with(fmt_layer).try_init()?;
        }
    }

    Ok(())
}
