//! Bounding-box extrema accumulated while scanning a program file

use serde::{Deserialize, Serialize};
use std::fmt;

/// Running minimum/maximum of every X and Y value seen in a program
///
/// A fresh record starts with sentinels beyond any legal coordinate
/// (`min = +bed`, `max = -bed`) so the first observed value always wins.
/// Updates are monotonic: minima only shrink, maxima only grow.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extrema {
    /// Smallest X seen
    pub min_x: f64,
    /// Smallest Y seen
    pub min_y: f64,
    /// Largest X seen
    pub max_x: f64,
    /// Largest Y seen
    pub max_y: f64,
}

impl Extrema {
    /// Create the "nothing seen yet" record for a bed of the given size
    pub fn sentinel(bed_width: f64, bed_height: f64) -> Self {
        Self {
            min_x: bed_width,
            min_y: bed_height,
            max_x: -bed_width,
            max_y: -bed_height,
        }
    }

    /// Fold an X value into the record
    pub fn include_x(&mut self, x: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
    }

    /// Fold a Y value into the record
    pub fn include_y(&mut self, y: f64) {
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    /// Whether any X value has been folded in
    pub fn has_x(&self) -> bool {
        self.min_x <= self.max_x
    }

    /// Whether any Y value has been folded in
    pub fn has_y(&self) -> bool {
        self.min_y <= self.max_y
    }

    /// Extent along X, or zero when nothing was seen
    pub fn width(&self) -> f64 {
        if self.has_x() {
            self.max_x - self.min_x
        } else {
            0.0
        }
    }

    /// Extent along Y, or zero when nothing was seen
    pub fn height(&self) -> f64 {
        if self.has_y() {
            self.max_y - self.min_y
        } else {
            0.0
        }
    }
}

impl fmt::Display for Extrema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:+.1},{:+.1}] [{:+.1},{:+.1}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_is_empty() {
        let extrema = Extrema::sentinel(200.0, 150.0);
        assert!(!extrema.has_x());
        assert!(!extrema.has_y());
        assert_eq!(extrema.width(), 0.0);
    }

    #[test]
    fn test_include_is_monotonic() {
        let mut extrema = Extrema::sentinel(200.0, 200.0);
        extrema.include_x(10.0);
        extrema.include_x(-3.0);
        extrema.include_x(4.0);
        extrema.include_y(-5.0);
        extrema.include_y(20.0);

        assert_eq!(extrema.min_x, -3.0);
        assert_eq!(extrema.max_x, 10.0);
        assert_eq!(extrema.min_y, -5.0);
        assert_eq!(extrema.max_y, 20.0);
        assert_eq!(extrema.width(), 13.0);
        assert_eq!(extrema.height(), 25.0);
    }

    #[test]
    fn test_display_summary() {
        let mut extrema = Extrema::sentinel(200.0, 200.0);
        extrema.include_x(-3.0);
        extrema.include_x(10.0);
        extrema.include_y(-5.0);
        extrema.include_y(20.0);
        assert_eq!(extrema.to_string(), "[-3.0,-5.0] [+10.0,+20.0]");
    }
}
