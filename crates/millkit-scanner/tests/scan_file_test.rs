use std::io::{self, Read, Write};

use millkit_scanner::{BoundingBoxScanner, ReaderSource, ScanError, ScanOptions};
use proptest::prelude::*;
use tempfile::NamedTempFile;

/// Reader that fails after yielding a fixed prefix
struct FailingReader {
    data: Vec<u8>,
    pos: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.data.len() {
            return Err(io::Error::other("card removed"));
        }
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[test]
fn test_scan_file() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        "G21\nG90\nG0 X0 Y0\n(outline)\nG1 X42.5 Y-7 F600\nG1 X-12 Y30.5\nM5\n"
    )
    .unwrap();

    let scanner = BoundingBoxScanner::default();
    let report = scanner.scan_file(file.path()).unwrap();

    assert_eq!(report.extrema.min_x, -12.0);
    assert_eq!(report.extrema.max_x, 42.5);
    assert_eq!(report.extrema.min_y, -7.0);
    assert_eq!(report.extrema.max_y, 30.5);
    assert_eq!(report.summary(), "[-12.0,-7.0] [+42.5,+30.5]");
    assert!(report.is_complete());
}

#[test]
fn test_scan_twice_is_identical() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "G1 X10 Y-5\r\n; G1 X999 Y999\r\nG1 X-3 Y20\r\n#G1 X80\n").unwrap();

    let scanner = BoundingBoxScanner::default();
    let first = scanner.scan_file(file.path()).unwrap();
    let second = scanner.scan_file(file.path()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.extrema.max_x, 10.0);
    assert!(first.stopped_at_macro);
}

#[test]
fn test_missing_file_is_an_error() {
    let scanner = BoundingBoxScanner::default();
    let err = scanner.scan_file("/nonexistent/job.gcode").unwrap_err();
    assert!(matches!(err, ScanError::Open { .. }));
}

#[test]
fn test_read_failure_keeps_partial_extrema() {
    let reader = FailingReader {
        data: b"G1 X4 Y5\nG1 X-2 Y".to_vec(),
        pos: 0,
    };
    let mut source = ReaderSource::new(reader);
    let report = BoundingBoxScanner::default().scan(&mut source);

    assert!(!report.is_complete());
    assert_eq!(report.read_error.as_deref(), Some("card removed"));
    assert_eq!(report.extrema.max_x, 4.0);
    assert_eq!(report.extrema.max_y, 5.0);
    assert_eq!(report.lines_parsed, 1);
}

#[test]
fn test_report_serializes() {
    let scanner = BoundingBoxScanner::new(ScanOptions {
        bed_width: 300.0,
        bed_height: 300.0,
        ..Default::default()
    });
    let report = scanner.scan_bytes(b"G1 X1 Y2\n");
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["extrema"]["max_x"], 1.0);
    assert_eq!(json["lines_parsed"], 1);
}

proptest! {
    #[test]
    fn prop_scan_is_idempotent(coords in prop::collection::vec((-500i32..500, -500i32..500), 1..40)) {
        let mut program = String::new();
        for (x, y) in &coords {
            program.push_str(&format!("G1 X{} Y{}\n", x, y));
        }
        let scanner = BoundingBoxScanner::new(ScanOptions {
            bed_width: 1000.0,
            bed_height: 1000.0,
            ..Default::default()
        });
        let first = scanner.scan_bytes(program.as_bytes());
        let second = scanner.scan_bytes(program.as_bytes());
        prop_assert_eq!(&first, &second);

        let min_x = coords.iter().map(|c| c.0).min().unwrap_or_default();
        let max_y = coords.iter().map(|c| c.1).max().unwrap_or_default();
        prop_assert_eq!(first.extrema.min_x, f64::from(min_x));
        prop_assert_eq!(first.extrema.max_y, f64::from(max_y));
    }
}
