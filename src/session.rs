//! Session facade for the presentation layer
//!
//! A [`Session`] owns the state the menus edit (configuration, milling
//! parameters) and the state a scan produces (the last [`ScanReport`]). Each
//! menu entry maps onto one method taking the machine capability it needs;
//! nothing here is global.

use std::fmt;
use std::path::Path;

use thiserror::Error;

use millkit_camtools::{
    CalibrationReport, CalibrationSequencer, CalibrationSettings, CamToolError, CornerJog,
    DiagonalTopGenerator, DrillCycleGenerator, EdgeAxis, EdgeMillGenerator, OperatorInput,
    PathGenerator, ProbeBlock, RasterTopGenerator,
};
use millkit_core::{
    Axis, CommandSink, Extrema, Machine, MillingParameters, PositionControl, ProbeOutcome,
};
use millkit_scanner::{BoundingBoxScanner, ScanError, ScanOptions, ScanReport};
use millkit_settings::{Config, ParameterBindings, ProbeBlockSettings};

/// Errors surfaced by session operations
#[derive(Error, Debug)]
pub enum SessionError {
    /// A generator or calibration sequence failed
    #[error(transparent)]
    CamTool(#[from] CamToolError),

    /// The program file could not be opened
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// Corner jog needs the extents of a scanned program
    #[error("No program has been scanned")]
    NoScan,
}

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Menu actions offered to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Raster surfacing of the top face
    RasterTop,
    /// Diagonal surfacing of the top face
    DiagonalTop,
    /// Mill the edge along X
    EdgeX,
    /// Mill the edge along Y
    EdgeY,
    /// Peck drill at the current position
    Drill,
    /// Probe the reference block to find the tool-change frame
    LocateToolWorkspace,
    /// Probe Z down onto the workpiece
    ProbeZDown,
    /// Zero X/Y of the milling frame here
    SetWorkpieceOrigin,
    /// Reference every axis here
    ResetAllAxes,
    /// Reference one axis here
    ResetAxis(Axis),
    /// Run the recorded tool-change move
    MoveToToolChange,
    /// Rapid to X0 Y0 of the milling frame
    MoveToWorkpieceOrigin,
    /// Disable every stepper driver
    DisableSteppers,
    /// Disable the Z stepper driver only
    DisableZStepper,
    /// Scan a program file for its extents
    ScanProgram,
    /// Jog around the scanned extents
    JogCorners,
}

impl Action {
    /// Actions safe to run while a job is running
    pub const WHILE_BUSY: [Action; 2] = [Action::ProbeZDown, Action::MoveToWorkpieceOrigin];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::RasterTop => write!(f, "Mill top"),
            Action::DiagonalTop => write!(f, "Mill top diagonal"),
            Action::EdgeX => write!(f, "Mill edge X"),
            Action::EdgeY => write!(f, "Mill edge Y"),
            Action::Drill => write!(f, "Drill"),
            Action::LocateToolWorkspace => write!(f, "Locate tool workspace"),
            Action::ProbeZDown => write!(f, "Probe Z down"),
            Action::SetWorkpieceOrigin => write!(f, "Set workpiece origin"),
            Action::ResetAllAxes => write!(f, "Reset all axes"),
            Action::ResetAxis(axis) => write!(f, "Reset {} axis", axis),
            Action::MoveToToolChange => write!(f, "Move to tool change"),
            Action::MoveToWorkpieceOrigin => write!(f, "Move to workpiece origin"),
            Action::DisableSteppers => write!(f, "Disable steppers"),
            Action::DisableZStepper => write!(f, "Disable Z stepper"),
            Action::ScanProgram => write!(f, "Scan program"),
            Action::JogCorners => write!(f, "Jog corners"),
        }
    }
}

fn probe_block(block: &ProbeBlockSettings) -> ProbeBlock {
    ProbeBlock {
        size_x: block.size_x,
        size_y: block.size_y,
        size_z: block.size_z,
        probe_travel: block.probe_travel,
        side_clearance: block.side_clearance,
        return_feed: block.return_feed,
    }
}

/// Operator session state and menu entry points
#[derive(Debug, Clone, Default)]
pub struct Session {
    config: Config,
    last_scan: Option<ScanReport>,
}

impl Session {
    /// Create a session over a loaded configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            last_scan: None,
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Declared parameter ranges
    pub fn bindings(&self) -> ParameterBindings {
        self.config.bindings()
    }

    /// Milling parameters as last edited
    pub fn milling(&self) -> &MillingParameters {
        &self.config.milling
    }

    /// Replace the milling parameters, clamped into their declared ranges
    pub fn set_milling(&mut self, params: MillingParameters) {
        let clamped = self.bindings().clamp_milling(&params);
        if clamped != params {
            tracing::debug!("Milling parameters clamped to {:?}", clamped);
        }
        self.config.milling = clamped;
    }

    /// Report of the last scan, if any
    pub fn last_scan(&self) -> Option<&ScanReport> {
        self.last_scan.as_ref()
    }

    /// Extents of the last scanned program
    pub fn extrema(&self) -> Option<&Extrema> {
        self.last_scan.as_ref().map(|report| &report.extrema)
    }

    /// Actions to offer; only a safe subset while a job is running
    pub fn available_actions(&self, busy: bool) -> Vec<Action> {
        if busy {
            return Action::WHILE_BUSY.to_vec();
        }

        let mut actions = vec![
            Action::RasterTop,
            Action::DiagonalTop,
            Action::EdgeX,
            Action::EdgeY,
            Action::Drill,
        ];
        if self.config.probing.block.is_some() {
            actions.push(Action::LocateToolWorkspace);
        }
        actions.extend([
            Action::ProbeZDown,
            Action::SetWorkpieceOrigin,
            Action::ResetAllAxes,
            Action::ResetAxis(Axis::X),
            Action::ResetAxis(Axis::Y),
            Action::ResetAxis(Axis::Z),
            Action::MoveToToolChange,
            Action::MoveToWorkpieceOrigin,
            Action::DisableSteppers,
            Action::DisableZStepper,
            Action::ScanProgram,
        ]);
        if self.extrema().is_some_and(|e| e.has_x() && e.has_y()) {
            actions.push(Action::JogCorners);
        }
        actions
    }

    /// Calibration settings derived from the configuration
    pub fn calibration_settings(&self) -> CalibrationSettings {
        let machine = &self.config.machine;
        let probing = &self.config.probing;
        CalibrationSettings {
            probe_hit_level: machine.probe_hit_level,
            z_probe_offset: probing.z_probe_offset,
            z_probe_travel: probing.z_probe_travel,
            retract_clearance: probing.retract_clearance,
            tool_diameter: self.config.milling.tool_diameter,
            probe_feed_x: machine.homing_feed_x,
            probe_feed_y: machine.homing_feed_y,
            probe_feed_z: machine.homing_feed_z,
            block: probing.block.as_ref().map(probe_block),
        }
    }

    /// Scanner options derived from the configuration
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            block_comments: self.config.scanner.block_comments,
            max_line_length: self.config.scanner.max_line_length,
            bed_width: self.config.machine.bed_width,
            bed_height: self.config.machine.bed_height,
        }
    }

    fn sequencer(&self) -> CalibrationSequencer {
        CalibrationSequencer::new(self.calibration_settings())
    }

    /// Raster surfacing generator for the current parameters
    pub fn raster_top(&self) -> RasterTopGenerator {
        RasterTopGenerator::new(self.config.milling)
    }

    /// Diagonal surfacing generator for the current parameters
    pub fn diagonal_top(&self) -> DiagonalTopGenerator {
        DiagonalTopGenerator::new(self.config.milling)
    }

    /// Edge generator for the current parameters
    pub fn edge(&self, edge: EdgeAxis) -> EdgeMillGenerator {
        EdgeMillGenerator::new(self.config.milling, edge)
    }

    /// Drill cycle for the current parameters, feed held to the drill ceiling
    pub fn drill(&self) -> DrillCycleGenerator {
        self.drill_with(&self.config.milling)
    }

    /// Drill cycle for unclamped parameters, clamped into the drilling ranges only
    pub fn drill_with(&self, params: &MillingParameters) -> DrillCycleGenerator {
        DrillCycleGenerator::new(self.bindings().clamp_drilling(params))
    }

    /// Run raster surfacing
    pub fn run_raster_top<S: CommandSink + ?Sized>(&self, sink: &mut S) -> SessionResult<()> {
        Ok(self.raster_top().run(sink)?)
    }

    /// Run diagonal surfacing, returning to the position read at start
    pub fn run_diagonal_top<M: CommandSink + PositionControl + ?Sized>(
        &self,
        machine: &mut M,
    ) -> SessionResult<()> {
        Ok(self.diagonal_top().run_on(machine)?)
    }

    /// Run edge milling along one axis
    pub fn run_edge<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        edge: EdgeAxis,
    ) -> SessionResult<()> {
        Ok(self.edge(edge).run(sink)?)
    }

    /// Run the peck drill cycle
    pub fn run_drill<S: CommandSink + ?Sized>(&self, sink: &mut S) -> SessionResult<()> {
        Ok(self.drill().run(sink)?)
    }

    /// Locate the tool-change frame against the reference block
    pub fn locate_tool_workspace<M: Machine + ?Sized>(
        &self,
        machine: &mut M,
    ) -> SessionResult<CalibrationReport> {
        Ok(self.sequencer().locate_tool_workspace(machine)?)
    }

    /// Probe Z down onto the workpiece
    pub fn probe_z_down<M: Machine + ?Sized>(&self, machine: &mut M) -> SessionResult<ProbeOutcome> {
        Ok(self.sequencer().probe_z_down(machine)?)
    }

    /// Zero X/Y of the milling frame at the current position
    pub fn set_workpiece_origin<S: CommandSink + ?Sized>(&self, sink: &mut S) -> SessionResult<()> {
        Ok(self.sequencer().set_workpiece_origin(sink)?)
    }

    /// Reference one axis, or every axis when `axis` is `None`
    pub fn reset_axes<M: CommandSink + PositionControl + ?Sized>(
        &self,
        machine: &mut M,
        axis: Option<Axis>,
    ) -> SessionResult<()> {
        let sequencer = self.sequencer();
        match axis {
            Some(axis) => sequencer.reset_axis(machine, axis)?,
            None => sequencer.reset_all_axes(machine)?,
        }
        Ok(())
    }

    /// Run the recorded tool-change move
    pub fn move_to_tool_change<S: CommandSink + ?Sized>(&self, sink: &mut S) -> SessionResult<()> {
        Ok(self.sequencer().move_to_tool_change(sink)?)
    }

    /// Rapid to X0 Y0 of the milling frame
    pub fn move_to_workpiece_origin<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> SessionResult<()> {
        Ok(self.sequencer().move_to_workpiece_origin(sink)?)
    }

    /// Disable every stepper, or only `axis`
    pub fn disable_steppers<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        axis: Option<Axis>,
    ) -> SessionResult<()> {
        Ok(self.sequencer().disable_steppers(sink, axis)?)
    }

    /// Scan a program file and keep its report
    pub fn scan_file(&mut self, path: impl AsRef<Path>) -> SessionResult<&ScanReport> {
        let report = BoundingBoxScanner::new(self.scan_options()).scan_file(path)?;
        tracing::info!("Program range {}", report.summary());
        Ok(&*self.last_scan.insert(report))
    }

    /// Scan an in-memory program and keep its report
    pub fn scan_bytes(&mut self, data: &[u8]) -> &ScanReport {
        let report = BoundingBoxScanner::new(self.scan_options()).scan_bytes(data);
        tracing::info!("Program range {}", report.summary());
        &*self.last_scan.insert(report)
    }

    /// Jog around the scanned extents until the operator confirms.
    ///
    /// Z adjustments start from the tool's live Z.
    pub fn jog_corners<M, I>(&self, machine: &mut M, input: &mut I) -> SessionResult<usize>
    where
        M: CommandSink + PositionControl + ?Sized,
        I: OperatorInput + ?Sized,
    {
        let extrema = self.extrema().ok_or(SessionError::NoScan)?;
        let start_z = machine.logical_position(Axis::Z);
        let mut jog = CornerJog::new(extrema, self.config.milling.tool_radius(), start_z)?;
        Ok(jog.run(machine, input)?)
    }
}
