use std::io;

use millkit_camtools::{
    DiagonalSweep, DiagonalTopGenerator, PathGenerator, RasterTopGenerator,
};
use millkit_core::{
    Axis, CommandSink, Directive, MillingParameters, Position, VirtualMachine,
};
use proptest::prelude::*;

/// Sink whose output goes away after a fixed number of batches
struct ClosingSink {
    accepted: usize,
    limit: usize,
}

impl CommandSink for ClosingSink {
    fn submit(&mut self, _text: &str) -> millkit_core::Result<()> {
        if self.accepted == self.limit {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "output closed").into());
        }
        self.accepted += 1;
        Ok(())
    }

    fn is_motion_queued(&self) -> bool {
        false
    }

    fn wait_for_idle(&mut self) -> millkit_core::Result<()> {
        Ok(())
    }
}

fn params(width: f64, height: f64, tool: f64, overlap: f64, layers: u32) -> MillingParameters {
    MillingParameters {
        area_width: width,
        area_height: height,
        tool_diameter: tool,
        pass_depth_count: layers,
        overlap_fraction: overlap,
        feed_speed: 400.0,
    }
}

fn positive_y_steps(gen: &RasterTopGenerator) -> f64 {
    gen.plan()
        .unwrap()
        .directives()
        .filter_map(|d| match d {
            Directive::Linear(words) => words.get(Axis::Y),
            _ => None,
        })
        .filter(|y| *y > 0.0)
        .sum()
}

#[test]
fn test_run_submits_batches_as_they_are_generated() {
    // Smallest tool and overlap at full depth: millions of rows per layer
    let gen = RasterTopGenerator::new(params(200.0, 200.0, 0.01, 0.01, 30));
    let mut sink = ClosingSink {
        accepted: 0,
        limit: 5,
    };

    let err = gen.run(&mut sink).unwrap_err();

    assert!(err.is_machine_error());
    assert_eq!(sink.accepted, 5);
}

#[test]
fn test_raster_layer_returns_to_start_corner() {
    let gen = RasterTopGenerator::new(params(60.0, 40.0, 6.0, 0.4, 3));
    let mut vm = VirtualMachine::new();
    gen.run(&mut vm).unwrap();

    let end = vm.machine_position();
    assert!(end.x.abs() < 1e-9);
    assert!(end.y.abs() < 1e-9);
    assert!((end.z + 3.0).abs() < 1e-9);
    assert_eq!(vm.lines().first().map(String::as_str), Some("G91"));
    assert_eq!(vm.lines().last().map(String::as_str), Some("G90"));
}

#[test]
fn test_raster_margin_depends_on_layer_parity() {
    let gen = RasterTopGenerator::new(params(11.0, 3.0, 2.0, 1.0, 2));
    let text = gen.generate().unwrap();
    let lines: Vec<_> = text.lines().collect();
    // Layer 0 closes with three moves, layer 1 with a single Y return
    assert_eq!(
        &lines[1..8],
        &[
            "G1 Z-1.000 F400.000",
            "G1 X10.000 F400.000",
            "G1 Y2.000",
            "G1 X-10.000",
            "G1 X10.000",
            "G1 Y-2.000",
            "G1 X-10.000",
        ]
    );
    assert_eq!(
        &lines[8..13],
        &[
            "G1 Z-1.000 F400.000",
            "G1 X10.000 F400.000",
            "G1 Y2.000",
            "G1 X-10.000",
            "G1 Y-2.000",
        ]
    );
    assert_eq!(lines[13], "G90");
}

#[test]
fn test_diagonal_reads_authoritative_position() {
    let gen = DiagonalTopGenerator::new(params(20.0, 10.0, 4.0, 0.5, 1));
    let mut vm = VirtualMachine::new();
    vm.place_at(Position::new(3.0, 4.0, 2.0));
    vm.queue_pending_motion(2);

    gen.run_on(&mut vm).unwrap();

    assert_eq!(
        vm.lines().last().map(String::as_str),
        Some("G0 X3.000 Y4.000")
    );
    assert_eq!(vm.machine_position(), Position::new(3.0, 4.0, 7.0));
}

#[test]
fn test_diagonal_stays_inside_rectangle() {
    let gen = DiagonalTopGenerator::new(params(30.0, 18.0, 3.0, 0.7, 1));
    let sweep = gen.sweep();
    for step in sweep {
        for (x, y) in step.points {
            assert!((-15.0 - 1e-9..=15.0 + 1e-9).contains(&x), "x={}", x);
            assert!((-9.0 - 1e-9..=9.0 + 1e-9).contains(&y), "y={}", y);
        }
    }
}

proptest! {
    #[test]
    fn prop_raster_rows_cover_height(
        tool in 0.5f64..10.0,
        overlap in 0.05f64..1.0,
        extra_w in 1.0f64..300.0,
        extra_h in 1.0f64..300.0,
    ) {
        let width = tool + extra_w;
        let height = tool + extra_h;
        let gen = RasterTopGenerator::new(params(width, height, tool, overlap, 1));
        let expected = height - tool / 2.0;
        let total = positive_y_steps(&gen);
        prop_assert!((total - expected).abs() < 1e-6, "total={} expected={}", total, expected);
    }

    #[test]
    fn prop_diagonal_frontiers_monotonic_and_bounded(
        w in 0.0f64..100.0,
        h in 0.0f64..100.0,
        step in 0.1f64..20.0,
    ) {
        let sweep = DiagonalSweep::new(w, h, step);
        let limit = sweep.max_iterations();
        let mut prev = (-w, -h);
        let mut count = 0usize;
        for s in sweep {
            prop_assert!(s.min_x >= prev.0);
            prop_assert!(s.min_y >= prev.1);
            prev = (s.min_x, s.min_y);
            count += 1;
            prop_assert!(count <= limit, "count={} limit={}", count, limit);
        }
    }
}
