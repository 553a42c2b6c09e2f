//! G-code word parsing and the streaming bounding-box scanner

pub mod parser;
pub mod scanner;

pub use parser::{is_motion, parse_line, parse_word, words, ParsedLine, Word};
pub use scanner::{BoundingBoxScanner, ScanOptions, ScanReport, DEFAULT_MAX_LINE_LENGTH};
