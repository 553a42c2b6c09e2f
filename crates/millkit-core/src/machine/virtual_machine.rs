//! Virtual motion engine
//!
//! An in-memory machine that interprets structured commands: distance mode,
//! workspace selection and per-workspace origins, G92, rapid/linear moves,
//! probing against configured contact planes, and M810 macros. It records
//! every line it receives so generated sequences can be inspected, and it
//! supports failure injection on position writes.

use std::collections::HashMap;

use crate::command::{Command, Directive, DistanceMode, MotionWords};
use crate::data::{Axis, PinLevel, Position, Workspace};
use crate::error::{ControllerError, Result};
use crate::machine::{CommandSink, PositionControl, ProbeInput, StatusEvent};

/// Simulated motion engine used for dry runs and tests
#[derive(Debug, Clone)]
pub struct VirtualMachine {
    lines: Vec<String>,
    distance_mode: DistanceMode,
    workspace: Workspace,
    machine_pos: [f64; 3],
    planner_pos: [f64; 3],
    origins: [[f64; 3]; 3],
    feed_rate: Option<f64>,
    referenced: [bool; 3],
    enabled: [bool; 3],
    planner_syncs: usize,
    queued_moves: usize,
    idle_calls: usize,
    dwell_ms: u64,
    beeps: usize,
    probe_hit_level: PinLevel,
    probe_level: PinLevel,
    contacts: [Option<f64>; 3],
    macros: HashMap<u8, Vec<Directive>>,
    events: Vec<StatusEvent>,
    failing_axis: Option<Axis>,
    fail_planner_sync: bool,
}

impl Default for VirtualMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualMachine {
    /// Create a machine at the origin of every workspace, probe hit level low
    pub fn new() -> Self {
        Self::with_probe_hit_level(PinLevel::Low)
    }

    /// Create a machine whose probe reads `hit_level` on contact
    pub fn with_probe_hit_level(hit_level: PinLevel) -> Self {
        Self {
            lines: Vec::new(),
            distance_mode: DistanceMode::Absolute,
            workspace: Workspace::Machine,
            machine_pos: [0.0; 3],
            planner_pos: [0.0; 3],
            origins: [[0.0; 3]; 3],
            feed_rate: None,
            referenced: [false; 3],
            enabled: [false; 3],
            planner_syncs: 0,
            queued_moves: 0,
            idle_calls: 0,
            dwell_ms: 0,
            beeps: 0,
            probe_hit_level: hit_level,
            probe_level: hit_level.inverted(),
            contacts: [None; 3],
            macros: HashMap::new(),
            events: Vec::new(),
            failing_axis: None,
            fail_planner_sync: false,
        }
    }

    /// Place a contact plane for probing along `axis` at a machine coordinate
    pub fn set_contact(&mut self, axis: Axis, machine_coordinate: f64) {
        self.contacts[axis.index()] = Some(machine_coordinate);
    }

    /// Remove the contact plane along `axis`
    pub fn clear_contact(&mut self, axis: Axis) {
        self.contacts[axis.index()] = None;
    }

    /// Move the tool without going through the command path
    pub fn place_at(&mut self, machine: Position) {
        for axis in Axis::ALL {
            self.machine_pos[axis.index()] = machine.get(axis);
        }
        self.planner_pos = self.machine_pos;
    }

    /// Make every logical position write on `axis` fail
    pub fn fail_position_writes_on(&mut self, axis: Axis) {
        self.failing_axis = Some(axis);
    }

    /// Make planner synchronisation fail
    pub fn fail_planner_sync(&mut self, fail: bool) {
        self.fail_planner_sync = fail;
    }

    /// Pretend motion is still executing
    pub fn queue_pending_motion(&mut self, moves: usize) {
        self.queued_moves += moves;
    }

    /// Every line received, in order
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Every line received, joined with `\n`
    pub fn transcript(&self) -> String {
        self.lines.join("\n")
    }

    /// Drop recorded lines and events, keeping machine state
    pub fn clear_history(&mut self) {
        self.lines.clear();
        self.events.clear();
    }

    /// Status notifications received
    pub fn events(&self) -> &[StatusEvent] {
        &self.events
    }

    /// Physical tool position
    pub fn machine_position(&self) -> Position {
        Position::new(self.machine_pos[0], self.machine_pos[1], self.machine_pos[2])
    }

    /// Position the planner believes the tool is at
    pub fn planner_position(&self) -> Position {
        Position::new(self.planner_pos[0], self.planner_pos[1], self.planner_pos[2])
    }

    /// Origin of a workspace in machine coordinates
    pub fn workspace_origin(&self, workspace: Workspace) -> Position {
        let o = self.origins[workspace.index()];
        Position::new(o[0], o[1], o[2])
    }

    /// Logical position of the tool in an arbitrary workspace
    pub fn position_in(&self, workspace: Workspace) -> Position {
        let o = self.origins[workspace.index()];
        Position::new(
            self.machine_pos[0] - o[0],
            self.machine_pos[1] - o[1],
            self.machine_pos[2] - o[2],
        )
    }

    /// Active distance mode
    pub fn distance_mode(&self) -> DistanceMode {
        self.distance_mode
    }

    /// Last programmed feed rate
    pub fn feed_rate(&self) -> Option<f64> {
        self.feed_rate
    }

    /// Whether an axis has been marked referenced
    pub fn is_referenced(&self, axis: Axis) -> bool {
        self.referenced[axis.index()]
    }

    /// Whether an axis driver is enabled
    pub fn is_enabled(&self, axis: Axis) -> bool {
        self.enabled[axis.index()]
    }

    /// Number of successful planner synchronisations
    pub fn planner_syncs(&self) -> usize {
        self.planner_syncs
    }

    /// Number of cooperative yields received
    pub fn idle_calls(&self) -> usize {
        self.idle_calls
    }

    /// Total dwell time requested (ms)
    pub fn dwell_ms(&self) -> u64 {
        self.dwell_ms
    }

    /// Number of completion beeps
    pub fn beeps(&self) -> usize {
        self.beeps
    }

    /// Body of a defined macro
    pub fn macro_body(&self, slot: u8) -> Option<&[Directive]> {
        self.macros.get(&slot).map(Vec::as_slice)
    }

    fn target(&self, axis: Axis, value: f64) -> f64 {
        match self.distance_mode {
            DistanceMode::Absolute => self.origins[self.workspace.index()][axis.index()] + value,
            DistanceMode::Relative => self.machine_pos[axis.index()] + value,
        }
    }

    fn apply_move(&mut self, words: &MotionWords) {
        for (axis, value) in words.axes() {
            self.machine_pos[axis.index()] = self.target(axis, value);
        }
        if let Some(feed) = words.feed_rate() {
            self.feed_rate = Some(feed);
        }
        self.planner_pos = self.machine_pos;
        self.queued_moves += 1;
    }

    fn apply_probe(&mut self, words: &MotionWords) {
        let mut hit = false;
        for (axis, value) in words.axes() {
            let i = axis.index();
            let start = self.machine_pos[i];
            let end = self.target(axis, value);
            let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
            match self.contacts[i] {
                Some(plane) if plane >= lo && plane <= hi => {
                    self.machine_pos[i] = plane;
                    hit = true;
                }
                _ => self.machine_pos[i] = end,
            }
        }
        if let Some(feed) = words.feed_rate() {
            self.feed_rate = Some(feed);
        }
        self.probe_level = if hit {
            self.probe_hit_level
        } else {
            self.probe_hit_level.inverted()
        };
        self.planner_pos = self.machine_pos;
        self.queued_moves += 1;
    }

    fn apply(&mut self, directive: &Directive) {
        match directive {
            Directive::Rapid(words) | Directive::Linear(words) => self.apply_move(words),
            Directive::Probe(words) => self.apply_probe(words),
            Directive::SetPosition(words) => {
                let ws = self.workspace.index();
                for (axis, value) in words.axes() {
                    self.origins[ws][axis.index()] = self.machine_pos[axis.index()] - value;
                }
            }
            Directive::Distance(mode) => self.distance_mode = *mode,
            Directive::SelectWorkspace(ws) => self.workspace = *ws,
            Directive::Dwell { millis } => self.dwell_ms += millis,
            Directive::WaitForMoves => self.queued_moves = 0,
            Directive::Beep => self.beeps += 1,
            Directive::DisableSteppers(axis) => match axis {
                Some(axis) => self.enabled[axis.index()] = false,
                None => self.enabled = [false; 3],
            },
            Directive::DefineMacro { slot, body } => {
                self.macros.insert(*slot, body.clone());
            }
            Directive::RunMacro { slot } => {
                if let Some(body) = self.macros.get(slot).cloned() {
                    for step in &body {
                        self.apply(step);
                    }
                } else {
                    tracing::warn!("Macro M{} is not defined", 810 + u16::from(*slot));
                }
            }
        }
    }
}

impl CommandSink for VirtualMachine {
    fn submit(&mut self, text: &str) -> Result<()> {
        tracing::trace!("Virtual machine received raw text: {}", text);
        self.lines.extend(text.lines().map(str::to_string));
        Ok(())
    }

    fn is_motion_queued(&self) -> bool {
        self.queued_moves > 0
    }

    fn wait_for_idle(&mut self) -> Result<()> {
        self.queued_moves = 0;
        Ok(())
    }

    fn service_idle(&mut self) {
        self.idle_calls += 1;
        self.queued_moves = 0;
    }

    fn notify(&mut self, event: StatusEvent) {
        self.events.push(event);
    }

    fn emit(&mut self, command: &Command) -> Result<()> {
        for directive in command.directives() {
            self.apply(directive);
            self.lines.push(directive.to_string());
        }
        Ok(())
    }
}

impl PositionControl for VirtualMachine {
    fn enable_axis(&mut self, axis: Axis) {
        self.enabled[axis.index()] = true;
    }

    fn mark_axis_referenced(&mut self, axis: Axis) {
        self.referenced[axis.index()] = true;
    }

    fn logical_position(&self, axis: Axis) -> f64 {
        self.machine_pos[axis.index()] - self.origins[self.workspace.index()][axis.index()]
    }

    fn set_logical_position(&mut self, axis: Axis, value: f64) -> Result<()> {
        if self.failing_axis == Some(axis) {
            return Err(ControllerError::PositionWriteFailed {
                axis,
                reason: "injected failure".to_string(),
            }
            .into());
        }
        let origin = self.origins[self.workspace.index()][axis.index()];
        self.machine_pos[axis.index()] = origin + value;
        Ok(())
    }

    fn synchronize_planner(&mut self) -> Result<()> {
        if self.fail_planner_sync {
            return Err(ControllerError::PlannerSyncFailed {
                reason: "injected failure".to_string(),
            }
            .into());
        }
        self.planner_pos = self.machine_pos;
        self.planner_syncs += 1;
        Ok(())
    }

    fn active_workspace(&self) -> Workspace {
        self.workspace
    }
}

impl ProbeInput for VirtualMachine {
    fn probe_level(&self) -> Result<PinLevel> {
        Ok(self.probe_level)
    }
}
