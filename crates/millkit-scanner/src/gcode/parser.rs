//! Word-level parsing of comment-free command lines
//!
//! Only axis letters and their numeric values matter to the scanner. A line
//! counts as motion when its first word is G0, G1, G2, G3, G5 or G38.x, or
//! when it starts directly with an axis word (modal motion continuing the
//! previous G-code).

use regex::Regex;
use serde::{Deserialize, Serialize};

use millkit_core::{Axis, GcodeError};

/// One letter/value word
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Word {
    /// Upper-case word letter
    pub letter: char,
    /// Numeric value as written
    pub value: f64,
}

impl Word {
    /// Axis addressed by this word, if any
    pub fn axis(&self) -> Option<Axis> {
        Axis::from_letter(self.letter)
    }
}

/// Words of one line and whether it moves the tool
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedLine {
    /// Words in order of appearance
    pub words: Vec<Word>,
    /// Whether the line is a motion command
    pub motion: bool,
}

impl ParsedLine {
    /// Values of one axis carried by this line
    pub fn axis_values(&self, axis: Axis) -> impl Iterator<Item = f64> + '_ {
        self.words
            .iter()
            .filter(move |w| w.axis() == Some(axis))
            .map(|w| w.value)
    }
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"([A-Za-z])\s*([-+]?(?:\d+\.?\d*|\.\d+))").expect("invalid regex pattern")
    })
}

/// Parse the value text of a word
pub fn parse_word(letter: char, value: &str) -> Result<Word, GcodeError> {
    let value = value
        .parse::<f64>()
        .map_err(|_| GcodeError::InvalidWord {
            letter,
            value: value.to_string(),
        })?;
    Ok(Word {
        letter: letter.to_ascii_uppercase(),
        value,
    })
}

/// Extract every word carrying an explicit number
pub fn words(line: &str) -> Vec<Word> {
    word_regex()
        .captures_iter(line)
        .filter_map(|caps| {
            let letter = caps.get(1)?.as_str().chars().next()?;
            let value = caps.get(2)?.as_str();
            match parse_word(letter, value) {
                Ok(word) => Some(word),
                Err(e) => {
                    tracing::trace!("Skipping word: {}", e);
                    None
                }
            }
        })
        .collect()
}

/// Whether a word list starts a motion command
pub fn is_motion(words: &[Word]) -> bool {
    // Line numbers do not decide what a line does
    let Some(first) = words.iter().find(|w| w.letter != 'N') else {
        return false;
    };
    if first.axis().is_some() {
        return true;
    }
    if first.letter != 'G' {
        return false;
    }
    let code = first.value;
    if code.fract() == 0.0 {
        matches!(code as i64, 0 | 1 | 2 | 3 | 5)
    } else {
        code.trunc() == 38.0
    }
}

/// Parse one comment-free line
pub fn parse_line(line: &str) -> ParsedLine {
    let words = words(line);
    let motion = is_motion(&words);
    ParsedLine { words, motion }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words_with_and_without_spaces() {
        let parsed = parse_line("G1X10.5 y-2 Z+.25 F300");
        assert!(parsed.motion);
        assert_eq!(parsed.words.len(), 5);
        assert_eq!(parsed.axis_values(Axis::X).collect::<Vec<_>>(), vec![10.5]);
        assert_eq!(parsed.axis_values(Axis::Y).collect::<Vec<_>>(), vec![-2.0]);
        assert_eq!(parsed.axis_values(Axis::Z).collect::<Vec<_>>(), vec![0.25]);
    }

    #[test]
    fn test_motion_recognition() {
        assert!(parse_line("G0 X1").motion);
        assert!(parse_line("G01 X1").motion);
        assert!(parse_line("g2 X1 Y1 I1 J0").motion);
        assert!(parse_line("G38.2 Z-10").motion);
        assert!(parse_line("N20 G1 X4").motion);
        assert!(parse_line("X5 Y6").motion);
        assert!(!parse_line("G92 X0 Y0").motion);
        assert!(!parse_line("G28 X0").motion);
        assert!(!parse_line("M117 X9").motion);
        assert!(!parse_line("G1.5 X3").motion);
        assert!(!parse_line("").motion);
    }

    #[test]
    fn test_bare_axis_letter_is_ignored() {
        let parsed = parse_line("G28 X Y");
        assert_eq!(parsed.words.len(), 1);
        assert_eq!(parsed.axis_values(Axis::X).count(), 0);
    }

    #[test]
    fn test_parse_word_error() {
        let err = parse_word('X', "abc").unwrap_err();
        assert_eq!(
            err,
            GcodeError::InvalidWord {
                letter: 'X',
                value: "abc".to_string()
            }
        );
    }
}
