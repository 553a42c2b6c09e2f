use std::io::Write;

use millkit::{
    Action, Axis, Config, EdgeAxis, MillingParameters, OperatorInput, PathGenerator, Position,
    PositionControl, ProbeOutcome, Session, SessionError, StreamSink, VirtualMachine, Workspace,
};
use tempfile::NamedTempFile;

/// Operator who confirms straight away
struct ConfirmAtOnce;

impl OperatorInput for ConfirmAtOnce {
    fn take_encoder_steps(&mut self) -> i32 {
        0
    }

    fn take_confirm(&mut self) -> bool {
        true
    }
}

/// Operator who turns the encoder one detent, then confirms
struct OneDetentThenConfirm {
    turned: bool,
}

impl OperatorInput for OneDetentThenConfirm {
    fn take_encoder_steps(&mut self) -> i32 {
        if self.turned {
            0
        } else {
            self.turned = true;
            1
        }
    }

    fn take_confirm(&mut self) -> bool {
        self.turned
    }
}

fn probing_config() -> Config {
    let mut config = Config::default();
    config.probing.z_probe_offset = 1.5;
    config.probing.z_probe_travel = 10.0;
    config.probing.retract_clearance = 10.0;
    config
}

#[test]
fn test_probe_z_down_through_session() {
    let session = Session::new(probing_config());
    let mut vm = VirtualMachine::new();
    vm.place_at(Position::new(10.0, 20.0, 30.0));
    vm.set_contact(Axis::Z, 25.0);

    let outcome = session.probe_z_down(&mut vm).unwrap();

    assert_eq!(outcome, ProbeOutcome::Hit);
    assert_eq!(
        vm.workspace_origin(Workspace::ToolChange),
        Position::new(10.0, 20.0, 33.5)
    );
    assert_eq!(vm.active_workspace(), Workspace::Milling);
}

#[test]
fn test_probe_miss_through_session() {
    let session = Session::new(probing_config());
    let mut vm = VirtualMachine::new();
    vm.place_at(Position::new(10.0, 20.0, 30.0));

    let outcome = session.probe_z_down(&mut vm).unwrap();

    assert_eq!(outcome, ProbeOutcome::Miss);
    assert_eq!(vm.workspace_origin(Workspace::ToolChange), Position::default());
    assert_eq!(vm.active_workspace(), Workspace::Machine);
}

#[test]
fn test_reset_single_axis() {
    let session = Session::default();
    let mut vm = VirtualMachine::new();
    vm.place_at(Position::new(4.0, 5.0, 6.0));

    session.reset_axes(&mut vm, Some(Axis::Y)).unwrap();

    assert!(vm.is_referenced(Axis::Y));
    assert!(!vm.is_referenced(Axis::X));
    assert_eq!(vm.logical_position(Axis::Y), 0.0);
    assert_eq!(vm.logical_position(Axis::X), 4.0);
}

#[test]
fn test_jog_requires_scan() {
    let session = Session::default();
    let mut vm = VirtualMachine::new();
    let err = session.jog_corners(&mut vm, &mut ConfirmAtOnce).unwrap_err();
    assert!(matches!(err, SessionError::NoScan));
}

#[test]
fn test_scan_file_then_jog() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "G1 X10 Y-5\n; G1 X999 Y999\nG1 X-3 Y20\n#").unwrap();

    let mut session = Session::default();
    let report = session.scan_file(file.path()).unwrap();
    assert_eq!(report.summary(), "[-3.0,-5.0] [+10.0,+20.0]");
    assert!(session.available_actions(false).contains(&Action::JogCorners));

    let mut vm = VirtualMachine::new();
    let moves = session.jog_corners(&mut vm, &mut ConfirmAtOnce).unwrap();
    assert_eq!(moves, 0);
    assert_eq!(vm.lines().last().map(String::as_str), Some("G0 X0.000 Y0.000"));
}

#[test]
fn test_jog_z_starts_from_live_height() {
    let mut session = Session::default();
    session.scan_bytes(b"G1 X1 Y1\nG1 X5 Y9\n");

    let mut vm = VirtualMachine::new();
    vm.place_at(Position::new(0.0, 0.0, 15.0));
    let mut input = OneDetentThenConfirm { turned: false };
    session.jog_corners(&mut vm, &mut input).unwrap();

    assert!(vm.lines().iter().any(|l| l == "G0 Z15.500"));
    assert_eq!(vm.machine_position(), Position::new(0.0, 0.0, 15.5));
}

#[test]
fn test_slow_drill_feed_skips_milling_floor() {
    let session = Session::default();
    let params = MillingParameters {
        feed_speed: 5.0,
        pass_depth_count: 1,
        ..*session.milling()
    };

    let text = session.drill_with(&params).generate().unwrap();
    assert!(text.contains("F5.000"));
    assert!(!text.contains("F10.000"));
}

#[test]
fn test_drill_feed_held_to_drill_ceiling() {
    let mut session = Session::default();
    session.set_milling(MillingParameters {
        feed_speed: 800.0,
        pass_depth_count: 2,
        ..Default::default()
    });
    assert_eq!(session.milling().feed_speed, 800.0);

    let text = session.drill().generate().unwrap();
    assert!(text.contains("F300.000"));
    assert!(!text.contains("F800.000"));

    let mut sink = StreamSink::new(Vec::new());
    session.run_edge(&mut sink, EdgeAxis::X).unwrap();
    let edge = String::from_utf8(sink.into_inner()).unwrap();
    assert!(edge.starts_with("G91\nG1 Z0.000 F800.000\n"));
}

#[test]
fn test_diagonal_returns_to_live_position() {
    let session = Session::default();
    let mut vm = VirtualMachine::new();
    vm.place_at(Position::new(50.0, 60.0, 5.0));

    session.run_diagonal_top(&mut vm).unwrap();

    assert_eq!(vm.current_position().x, 50.0);
    assert_eq!(vm.current_position().y, 60.0);
}
