//! Probe and origin calibration sequences
//!
//! Workspace convention: G54 is machine-physical, G55 holds the tool-change
//! position found by the last successful Z probe and G56 is the workpiece
//! milling frame.
//!
//! Every probe is followed by a wait for the motion engine to drain and a
//! read of the probe pin. A probe is a hit iff the pin reads the configured
//! hit level. A miss aborts the remaining origin updates.

use serde::{Deserialize, Serialize};

use millkit_core::{
    Axis, Command, CommandSink, Directive, DistanceMode, Machine, MotionWords, PinLevel,
    PositionControl, ProbeInput, ProbeOutcome, StatusEvent, Workspace, TOOL_CHANGE_MACRO_SLOT,
};

use crate::error::CamToolResult;

/// Reference block used by the tool-workspace locate sequence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbeBlock {
    /// Block size along X (mm)
    pub size_x: f64,
    /// Block size along Y (mm)
    pub size_y: f64,
    /// Block height (mm)
    pub size_z: f64,
    /// Maximum travel of each probe move (mm)
    pub probe_travel: f64,
    /// Clearance kept from the block between probes (mm)
    pub side_clearance: f64,
    /// Feed for the final return to the new zero (mm/min)
    pub return_feed: f64,
}

impl Default for ProbeBlock {
    fn default() -> Self {
        Self {
            size_x: 35.0,
            size_y: 60.0,
            size_z: 10.0,
            probe_travel: 100.0,
            side_clearance: 10.0,
            return_feed: 200.0,
        }
    }
}

/// Settings for the calibration sequences
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSettings {
    /// Pin level that means "contact"
    pub probe_hit_level: PinLevel,
    /// Z assigned to the probed surface in the milling frame
    pub z_probe_offset: f64,
    /// Maximum downward travel of the Z probe (mm)
    pub z_probe_travel: f64,
    /// Absolute Z the tool retracts to after a successful Z probe
    pub retract_clearance: f64,
    /// Tool diameter, used to offset side probes (mm)
    pub tool_diameter: f64,
    /// Feed of the X side probe (mm/min)
    pub probe_feed_x: f64,
    /// Feed of the Y side probe (mm/min)
    pub probe_feed_y: f64,
    /// Feed of the Z probe onto the block (mm/min)
    pub probe_feed_z: f64,
    /// Reference block; `None` disables tool-workspace locate
    pub block: Option<ProbeBlock>,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            probe_hit_level: PinLevel::Low,
            z_probe_offset: 0.0,
            z_probe_travel: 10.0,
            retract_clearance: 10.0,
            tool_diameter: 3.0,
            probe_feed_x: 3000.0,
            probe_feed_y: 3000.0,
            probe_feed_z: 240.0,
            block: None,
        }
    }
}

/// Result of the tool-workspace locate sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalibrationReport {
    /// All three probes hit and the tool-change frame was zeroed
    Completed,
    /// The probe along this axis found no contact; later steps were skipped
    ProbeMissed(Axis),
    /// No reference block is configured
    Skipped,
}

/// Issues calibration sequences to a machine
#[derive(Debug, Clone)]
pub struct CalibrationSequencer {
    settings: CalibrationSettings,
}

impl CalibrationSequencer {
    /// Create a sequencer with the given settings
    pub fn new(settings: CalibrationSettings) -> Self {
        Self { settings }
    }

    /// Settings in use
    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    /// Wait for the probe move to finish, then sample the pin
    fn probe_outcome<M: Machine + ?Sized>(&self, machine: &mut M) -> CamToolResult<ProbeOutcome> {
        machine.wait_for_idle()?;
        let level = machine.probe_level()?;
        Ok(ProbeOutcome::from_pin(level, self.settings.probe_hit_level))
    }

    /// Locate the tool-change frame against the reference block
    ///
    /// Probes Z down onto the block top, then X and then Y against its
    /// sides. Each probe assumes the previous axis is already zeroed, so the
    /// order is fixed.
    pub fn locate_tool_workspace<M: Machine + ?Sized>(
        &self,
        machine: &mut M,
    ) -> CamToolResult<CalibrationReport> {
        let Some(block) = self.settings.block else {
            tracing::warn!("Tool workspace locate requested without a probe block");
            return Ok(CalibrationReport::Skipped);
        };
        let tool = self.settings.tool_diameter;
        let clearance = block.side_clearance;
        machine.notify(StatusEvent::Started("Locate tool workspace".to_string()));

        machine.emit(
            &Command::single(Directive::SelectWorkspace(Workspace::ToolChange))
                .with(Directive::Distance(DistanceMode::Relative))
                .with(Directive::probe(
                    MotionWords::new()
                        .z(-block.probe_travel)
                        .feed(self.settings.probe_feed_z),
                )),
        )?;
        if !self.probe_outcome(machine)?.is_hit() {
            return self.abort_locate(machine, Axis::Z);
        }

        machine.emit(
            &Command::single(Directive::set_position(MotionWords::new().z(0.0)))
                .with(Directive::rapid(MotionWords::new().z(clearance)))
                .with(Directive::rapid(MotionWords::new().x(tool + block.size_x)))
                .with(Directive::rapid(
                    MotionWords::new().z(-(block.size_z / 2.0 + clearance)),
                ))
                .with(Directive::probe(
                    MotionWords::new()
                        .x(-block.probe_travel)
                        .feed(self.settings.probe_feed_x),
                )),
        )?;
        if !self.probe_outcome(machine)?.is_hit() {
            return self.abort_locate(machine, Axis::X);
        }

        machine.emit(
            &Command::single(Directive::set_position(MotionWords::new().x(tool / 2.0)))
                .with(Directive::rapid(MotionWords::new().x(clearance)))
                .with(Directive::rapid(MotionWords::new().y(block.size_y + tool)))
                .with(Directive::rapid(
                    MotionWords::new().x(-(clearance + block.size_x / 2.0)),
                ))
                .with(Directive::probe(
                    MotionWords::new()
                        .y(-block.probe_travel)
                        .feed(self.settings.probe_feed_y),
                )),
        )?;
        if !self.probe_outcome(machine)?.is_hit() {
            return self.abort_locate(machine, Axis::Y);
        }

        machine.emit(
            &Command::single(Directive::set_position(MotionWords::new().y(tool / 2.0)))
                .with(Directive::rapid(MotionWords::new().y(clearance).z(clearance)))
                .with(Directive::Distance(DistanceMode::Absolute))
                .with(Directive::linear(
                    MotionWords::new()
                        .x(0.0)
                        .y(0.0)
                        .z(0.0)
                        .feed(block.return_feed),
                )),
        )?;
        tracing::info!("Tool workspace located");
        machine.notify(StatusEvent::Completed("Locate tool workspace".to_string()));
        Ok(CalibrationReport::Completed)
    }

    fn abort_locate<M: Machine + ?Sized>(
        &self,
        machine: &mut M,
        axis: Axis,
    ) -> CamToolResult<CalibrationReport> {
        tracing::warn!("Tool workspace locate: {} probe found no contact", axis);
        machine.emit(&Directive::Distance(DistanceMode::Absolute).into())?;
        machine.notify(StatusEvent::ProbeMissed(format!("{} probe", axis)));
        Ok(CalibrationReport::ProbeMissed(axis))
    }

    /// Probe down onto the workpiece and record the tool-change position
    ///
    /// On a hit the milling frame gets `Z = z_probe_offset` at the contact
    /// point, the tool retracts, the G55 frame is zeroed at the retracted
    /// position and the tool-change macro is redefined to return there. On a
    /// miss no origin is touched and the prior workspace is re-selected.
    pub fn probe_z_down<M: Machine + ?Sized>(&self, machine: &mut M) -> CamToolResult<ProbeOutcome> {
        let prior = machine.active_workspace();
        machine.notify(StatusEvent::Started("Probe Z".to_string()));
        machine.emit(
            &Command::single(Directive::SelectWorkspace(Workspace::Milling))
                .with(Directive::Distance(DistanceMode::Relative))
                .with(Directive::probe(
                    MotionWords::new().z(-self.settings.z_probe_travel),
                ))
                .with(Directive::Distance(DistanceMode::Absolute)),
        )?;

        let outcome = self.probe_outcome(machine)?;
        if !outcome.is_hit() {
            tracing::warn!(
                "Z probe found no contact within {:.3} mm",
                self.settings.z_probe_travel
            );
            machine.emit(&Directive::SelectWorkspace(prior).into())?;
            machine.notify(StatusEvent::ProbeMissed("Z probe".to_string()));
            return Ok(outcome);
        }

        machine.emit(
            &Command::single(Directive::set_position(
                MotionWords::new().z(self.settings.z_probe_offset),
            ))
            .with(Directive::linear(
                MotionWords::new().z(self.settings.retract_clearance),
            ))
            .with(Directive::WaitForMoves),
        )?;
        machine.emit(
            &Command::single(Directive::SelectWorkspace(Workspace::ToolChange))
                .with(Directive::Distance(DistanceMode::Absolute))
                .with(Directive::set_position(
                    MotionWords::new().x(0.0).y(0.0).z(0.0),
                )),
        )?;
        machine.emit(
            &Command::single(Directive::DefineMacro {
                slot: TOOL_CHANGE_MACRO_SLOT,
                body: vec![
                    Directive::SelectWorkspace(Workspace::ToolChange),
                    Directive::rapid(MotionWords::new().z(0.0)),
                    Directive::rapid(MotionWords::new().x(0.0).y(0.0)),
                ],
            })
            .with(Directive::SelectWorkspace(Workspace::Milling)),
        )?;
        tracing::info!("Z probe hit; tool change position recorded");
        machine.notify(StatusEvent::Completed("Probe Z".to_string()));
        Ok(outcome)
    }

    /// Zero X and Y of the milling frame at the current position
    pub fn set_workpiece_origin<S: CommandSink + ?Sized>(&self, sink: &mut S) -> CamToolResult<()> {
        sink.emit(
            &Command::single(Directive::SelectWorkspace(Workspace::Milling))
                .with(Directive::set_position(MotionWords::new().x(0.0).y(0.0)))
                .with(Directive::Beep),
        )?;
        tracing::info!("Workpiece origin set");
        sink.notify(StatusEvent::Completed("Set workpiece origin".to_string()));
        Ok(())
    }

    /// Reference every axis at its current position
    pub fn reset_all_axes<M: CommandSink + PositionControl + ?Sized>(
        &self,
        machine: &mut M,
    ) -> CamToolResult<()> {
        self.reset_axes(machine, &Axis::ALL)
    }

    /// Reference one axis at its current position
    pub fn reset_axis<M: CommandSink + PositionControl + ?Sized>(
        &self,
        machine: &mut M,
        axis: Axis,
    ) -> CamToolResult<()> {
        self.reset_axes(machine, &[axis])
    }

    /// Zero the logical position of `axes` and re-synchronise the planner
    ///
    /// Either every position write and the planner sync succeed, or the
    /// previous logical positions are written back and the error returned.
    pub fn reset_axes<M: CommandSink + PositionControl + ?Sized>(
        &self,
        machine: &mut M,
        axes: &[Axis],
    ) -> CamToolResult<()> {
        let snapshot: Vec<(Axis, f64)> = axes
            .iter()
            .map(|&axis| (axis, machine.logical_position(axis)))
            .collect();
        for &axis in axes {
            machine.enable_axis(axis);
        }

        let mut written = Vec::with_capacity(axes.len());
        for &(axis, previous) in &snapshot {
            if let Err(e) = machine.set_logical_position(axis, 0.0) {
                restore_positions(machine, &written);
                return Err(e.into());
            }
            written.push((axis, previous));
        }
        if let Err(e) = machine.synchronize_planner() {
            restore_positions(machine, &written);
            return Err(e.into());
        }

        for &axis in axes {
            machine.mark_axis_referenced(axis);
        }
        tracing::info!("Axes referenced at current position: {:?}", axes);
        machine.notify(StatusEvent::Completed("Reset axes".to_string()));
        Ok(())
    }

    /// Run the tool-change macro recorded by the last successful Z probe
    pub fn move_to_tool_change<S: CommandSink + ?Sized>(&self, sink: &mut S) -> CamToolResult<()> {
        sink.emit(
            &Directive::RunMacro {
                slot: TOOL_CHANGE_MACRO_SLOT,
            }
            .into(),
        )?;
        Ok(())
    }

    /// Rapid to X0 Y0 of the milling frame
    pub fn move_to_workpiece_origin<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
    ) -> CamToolResult<()> {
        sink.emit(
            &Command::single(Directive::SelectWorkspace(Workspace::Milling))
                .with(Directive::rapid(MotionWords::new().x(0.0).y(0.0))),
        )?;
        Ok(())
    }

    /// Disable all stepper drivers, or only one axis
    pub fn disable_steppers<S: CommandSink + ?Sized>(
        &self,
        sink: &mut S,
        axis: Option<Axis>,
    ) -> CamToolResult<()> {
        sink.emit(&Directive::DisableSteppers(axis).into())?;
        Ok(())
    }
}

fn restore_positions<M: PositionControl + ?Sized>(machine: &mut M, written: &[(Axis, f64)]) {
    for &(axis, value) in written.iter().rev() {
        if let Err(e) = machine.set_logical_position(axis, value) {
            tracing::error!("Failed to restore {} position after reset error: {}", axis, e);
        }
    }
}
