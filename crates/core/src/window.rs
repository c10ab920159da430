use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// Slack allowed when a serialized window carries its own `range`.
const RANGE_TOLERANCE_US: f64 = 1e-6;

/// A span of trace time in microseconds.
///
/// Immutable: `range` is always `max - min`. Build a new window instead of
/// adjusting an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeWindow")]
pub struct TimeWindow {
    min: f64,
    max: f64,
    range: f64,
}

#[derive(Deserialize)]
struct RawTimeWindow {
    min: f64,
    max: f64,
    #[serde(default)]
    range: Option<f64>,
}

impl TryFrom<RawTimeWindow> for TimeWindow {
    type Error = OverlayError;

    fn try_from(raw: RawTimeWindow) -> Result<Self, Self::Error> {
        let window = TimeWindow::new(raw.min, raw.max)?;
        match raw.range {
            Some(range) if (range - window.range).abs() > RANGE_TOLERANCE_US => {
                Err(OverlayError::InvalidRange {
                    min: raw.min,
                    max: raw.max,
                })
            }
            _ => Ok(window),
        }
    }
}

impl TimeWindow {
    pub fn new(min: f64, max: f64) -> Result<Self, OverlayError> {
        if !min.is_finite() || !max.is_finite() || max < min {
            return Err(OverlayError::InvalidRange { min, max });
        }
        Ok(Self {
            min,
            max,
            range: max - min,
        })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn range(&self) -> f64 {
        self.range
    }

    /// Inclusive on both ends.
    pub fn contains(&self, ts: f64) -> bool {
        ts >= self.min && ts <= self.max
    }

    /// Whether the two windows share at least one instant.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.min <= other.max && other.min <= self.max
    }

    /// Same duration, shifted by `delta` microseconds.
    pub fn shifted(&self, delta: f64) -> Result<Self, OverlayError> {
        Self::new(self.min + delta, self.max + delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_is_derived() {
        let w = TimeWindow::new(10.0, 110.0).expect("valid window");
        assert!((w.range() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_inverted_bounds() {
        assert_eq!(
            TimeWindow::new(5.0, 4.0),
            Err(OverlayError::InvalidRange { min: 5.0, max: 4.0 })
        );
        assert!(TimeWindow::new(f64::NAN, 4.0).is_err());
        assert!(TimeWindow::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn zero_length_window_is_valid() {
        let w = TimeWindow::new(3.0, 3.0).expect("valid window");
        assert_eq!(w.range(), 0.0);
        assert!(w.contains(3.0));
    }

    #[test]
    fn containment_and_overlap() {
        let w = TimeWindow::new(0.0, 100.0).expect("valid window");
        assert!(w.contains(0.0));
        assert!(w.contains(100.0));
        assert!(!w.contains(100.5));

        let later = TimeWindow::new(100.0, 200.0).expect("valid window");
        let disjoint = TimeWindow::new(150.0, 200.0).expect("valid window");
        assert!(w.overlaps(&later));
        assert!(!w.overlaps(&disjoint));
    }

    #[test]
    fn shifted_keeps_range() {
        let w = TimeWindow::new(0.0, 50.0).expect("valid window");
        let s = w.shifted(25.0).expect("valid window");
        assert_eq!(s.min(), 25.0);
        assert_eq!(s.max(), 75.0);
        assert_eq!(s.range(), w.range());
    }

    #[test]
    fn deserializes_with_and_without_range() {
        let w: TimeWindow = serde_json::from_str(r#"{"min":0,"max":10}"#).expect("parse");
        assert_eq!(w.range(), 10.0);
        let w: TimeWindow =
            serde_json::from_str(r#"{"min":0,"max":10,"range":10}"#).expect("parse");
        assert_eq!(w.max(), 10.0);
        assert!(serde_json::from_str::<TimeWindow>(r#"{"min":0,"max":10,"range":3}"#).is_err());
        assert!(serde_json::from_str::<TimeWindow>(r#"{"min":10,"max":0}"#).is_err());
    }
}
