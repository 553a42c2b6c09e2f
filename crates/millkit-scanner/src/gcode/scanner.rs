//! Streaming bounding-box scanner
//!
//! Reconstructs command lines from a byte stream and folds every explicit X
//! and Y value of every motion line into an [`Extrema`] record, without
//! executing anything.
//!
//! Line terminators are `\n`, `\r`, and `:` or `#` outside comments. `#`
//! additionally ends the scan after the line it terminates. `;` starts a
//! comment running to the end of the line; `(` and `)` bracket a block
//! comment when enabled. Comment state resets at every terminator. Bytes
//! beyond the maximum line length are dropped until the next terminator.

use std::path::Path;

use serde::{Deserialize, Serialize};

use millkit_core::{Axis, Extrema};

use super::parser::parse_line;
use crate::error::ScanResult;
use crate::source::{ByteSource, ReaderSource, SliceSource};

/// Default maximum buffered line length, terminator included
pub const DEFAULT_MAX_LINE_LENGTH: usize = 96;

/// Scanner configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScanOptions {
    /// Treat `( ... )` as comments
    pub block_comments: bool,
    /// Maximum buffered line length, terminator included
    pub max_line_length: usize,
    /// Bed width used for the initial sentinels (mm)
    pub bed_width: f64,
    /// Bed height used for the initial sentinels (mm)
    pub bed_height: f64,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            block_comments: true,
            max_line_length: DEFAULT_MAX_LINE_LENGTH,
            bed_width: 200.0,
            bed_height: 200.0,
        }
    }
}

/// Outcome of one scan pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Accumulated X/Y extrema
    pub extrema: Extrema,
    /// Non-empty lines flushed
    pub lines_parsed: usize,
    /// Lines recognised as motion
    pub motion_lines: usize,
    /// Lines that overflowed the buffer
    pub truncated_lines: usize,
    /// Whether a `#` ended the scan before end of file
    pub stopped_at_macro: bool,
    /// Read failure that ended the scan early
    pub read_error: Option<String>,
}

impl ScanReport {
    /// One-line summary: `[minX,minY] [maxX,maxY]`
    pub fn summary(&self) -> String {
        self.extrema.to_string()
    }

    /// Whether the scan reached the end of the program or its stop token
    pub fn is_complete(&self) -> bool {
        self.read_error.is_none()
    }
}

/// Transient parse state of one scan
#[derive(Debug, Default)]
struct ScanCursor {
    line: String,
    in_line_comment: bool,
    in_block_comment: bool,
    truncated: bool,
    cut_mid_word: bool,
}

impl ScanCursor {
    fn in_comment(&self) -> bool {
        self.in_line_comment || self.in_block_comment
    }

    fn reset(&mut self) {
        self.line.clear();
        self.in_line_comment = false;
        self.in_block_comment = false;
        self.truncated = false;
        self.cut_mid_word = false;
    }
}

/// Bounding-box scanner over program files
#[derive(Debug, Clone, Default)]
pub struct BoundingBoxScanner {
    options: ScanOptions,
}

impl BoundingBoxScanner {
    /// Create a scanner with the given options
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    /// Options in use
    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    /// Open and scan a program file
    pub fn scan_file(&self, path: impl AsRef<Path>) -> ScanResult<ScanReport> {
        let path = path.as_ref();
        tracing::info!("Scanning {}", path.display());
        let mut source = ReaderSource::open(path)?;
        Ok(self.scan(&mut source))
    }

    /// Scan an in-memory program
    pub fn scan_bytes(&self, data: &[u8]) -> ScanReport {
        self.scan(&mut SliceSource::new(data))
    }

    /// Scan a byte source to its end or stop token
    pub fn scan<S: ByteSource + ?Sized>(&self, source: &mut S) -> ScanReport {
        let mut report = ScanReport {
            extrema: Extrema::sentinel(self.options.bed_width, self.options.bed_height),
            lines_parsed: 0,
            motion_lines: 0,
            truncated_lines: 0,
            stopped_at_macro: false,
            read_error: None,
        };
        let mut cursor = ScanCursor::default();
        // Room for the terminator, as in a fixed command buffer
        let capacity = self.options.max_line_length.saturating_sub(1);

        loop {
            let byte = match source.next_byte() {
                Ok(Some(byte)) => byte,
                Ok(None) => {
                    self.flush(&mut cursor, &mut report);
                    break;
                }
                Err(e) => {
                    tracing::error!("Read error while scanning: {}", e);
                    report.read_error = Some(e.to_string());
                    break;
                }
            };
            let c = char::from(byte);

            let terminator =
                c == '\n' || c == '\r' || ((c == '#' || c == ':') && !cursor.in_comment());
            if terminator {
                self.flush(&mut cursor, &mut report);
                if c == '#' {
                    report.stopped_at_macro = true;
                    break;
                }
                continue;
            }

            if c == ';' {
                cursor.in_line_comment = true;
            }
            if self.options.block_comments && !cursor.in_line_comment {
                if c == '(' {
                    cursor.in_block_comment = true;
                } else if c == ')' && cursor.in_block_comment {
                    cursor.in_block_comment = false;
                    continue;
                }
            }
            if cursor.in_comment() {
                continue;
            }

            if cursor.line.len() >= capacity {
                if !cursor.truncated {
                    cursor.truncated = true;
                    cursor.cut_mid_word = splits_word(cursor.line.chars().last(), c);
                }
                continue;
            }
            cursor.line.push(c);
        }

        tracing::info!(
            "Scan done: {} lines, {} motion, range {}",
            report.lines_parsed,
            report.motion_lines,
            report.summary()
        );
        report
    }

    fn flush(&self, cursor: &mut ScanCursor, report: &mut ScanReport) {
        if cursor.truncated {
            tracing::warn!(
                "Line exceeds {} characters; excess dropped",
                self.options.max_line_length
            );
            report.truncated_lines += 1;
            if cursor.cut_mid_word {
                drop_trailing_word(&mut cursor.line);
            }
        }

        if !cursor.line.trim().is_empty() {
            report.lines_parsed += 1;
            let parsed = parse_line(&cursor.line);
            if parsed.motion {
                report.motion_lines += 1;
                for x in parsed.axis_values(Axis::X) {
                    report.extrema.include_x(x);
                }
                for y in parsed.axis_values(Axis::Y) {
                    report.extrema.include_y(y);
                }
            }
        }
        cursor.reset();
    }
}

/// Whether a cut between `last` and `next` leaves an incomplete word behind.
///
/// A word is incomplete when its letter has no value yet, when only its sign
/// was kept, or when `next` carries on its number.
fn splits_word(last: Option<char>, next: char) -> bool {
    match last {
        Some(last) if last.is_ascii_alphabetic() || last == '-' || last == '+' => true,
        Some(last) if last.is_ascii_digit() || last == '.' => {
            next.is_ascii_digit() || next == '.'
        }
        _ => false,
    }
}

/// Remove a word the buffer limit cut in half
fn drop_trailing_word(line: &mut String) {
    let cut = line
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_ascii_alphabetic() || c.is_ascii_whitespace())
        .map(|(i, _)| i)
        .unwrap_or(0);
    line.truncate(cut);
}
