use millkit_camtools::{DrillCycleGenerator, EdgeAxis, EdgeMillGenerator, PathGenerator};
use millkit_core::{Axis, Directive, MillingParameters, Position, VirtualMachine};

fn params(width: f64, height: f64, depth: u32) -> MillingParameters {
    MillingParameters {
        area_width: width,
        area_height: height,
        tool_diameter: 3.0,
        pass_depth_count: depth,
        overlap_fraction: 0.5,
        feed_speed: 180.0,
    }
}

#[test]
fn test_edge_x_emits_n_pairs() {
    let gen = EdgeMillGenerator::new(params(50.0, 20.0, 3), EdgeAxis::X);
    let path = gen.plan().unwrap();

    let forward = path
        .directives()
        .filter(|d| match d {
            Directive::Linear(w) => w.get(Axis::X) == Some(50.0) && w.get(Axis::Z) == Some(-1.0),
            _ => false,
        })
        .count();
    let back = path
        .directives()
        .filter(|d| match d {
            Directive::Linear(w) => w.get(Axis::X) == Some(-50.0) && w.get(Axis::Z).is_none(),
            _ => false,
        })
        .count();
    assert_eq!(forward, 3);
    assert_eq!(back, 3);

    let mut vm = VirtualMachine::new();
    gen.run(&mut vm).unwrap();
    assert_eq!(vm.machine_position(), Position::new(0.0, 0.0, -3.0));
    assert_eq!(vm.feed_rate(), Some(180.0));
}

#[test]
fn test_edge_y_uses_area_height() {
    let gen = EdgeMillGenerator::new(params(50.0, 20.0, 1), EdgeAxis::Y);
    let text = gen.generate().unwrap();
    assert!(text.contains("G1 Y20.000 Z-1.000\nG1 Y-20.000\n"));
    assert!(!text.contains('X'));
}

#[test]
fn test_edge_zero_depth() {
    let gen = EdgeMillGenerator::new(params(50.0, 20.0, 0), EdgeAxis::X);
    assert_eq!(gen.generate().unwrap(), "G91\nG1 Z0.000 F180.000\nG90\n");
}

#[test]
fn test_drill_pairs_and_full_retract() {
    let gen = DrillCycleGenerator::new(params(0.0, 0.0, 4));
    let path = gen.plan().unwrap();

    let plunges = path
        .directives()
        .filter(|d| matches!(d, Directive::Linear(w) if w.get(Axis::Z) == Some(-3.0)))
        .count();
    let retracts: Vec<f64> = path
        .directives()
        .filter_map(|d| match d {
            Directive::Rapid(w) => w.get(Axis::Z),
            _ => None,
        })
        .collect();
    assert_eq!(plunges, 4);
    assert_eq!(retracts, vec![2.0, 2.0, 2.0, 2.0, 4.0]);
    assert_eq!(gen.total_depth(), 4.0);

    let mut vm = VirtualMachine::new();
    gen.run(&mut vm).unwrap();
    assert_eq!(vm.machine_position(), Position::new(0.0, 0.0, 0.0));
    assert_eq!(vm.dwell_ms(), 400);
    assert_eq!(vm.lines().last().map(String::as_str), Some("G90"));
}
