use serde::{Deserialize, Serialize};
use timeline_overlays_protocol::OverlayKind;

use crate::error::OverlayError;
use crate::window::TimeWindow;

/// A logical overlay, generic over the provider's entry handle.
///
/// JSON form uses a `type` tag, e.g.
/// `{"type":"TIME_RANGE","bounds":{"min":0,"max":10},"label":"","show_duration":true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Overlay<E> {
    /// Highlight of the currently selected entry.
    EntrySelected { entry: E },
    /// User annotation text attached to an entry.
    EntryLabel { entry: E, label: String },
    /// Shaded span of time, optionally captioned with its duration.
    TimeRange {
        bounds: TimeWindow,
        #[serde(default)]
        label: String,
        #[serde(default)]
        show_duration: bool,
    },
    /// Several adjacent spans drawn as one strip, optionally under an entry.
    TimespanBreakdown {
        sections: Vec<BreakdownSection>,
        entry: Option<E>,
    },
    /// Vertical line at one instant, e.g. the hover cursor.
    TimestampMarker { timestamp: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownSection {
    pub bounds: TimeWindow,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub show_duration: bool,
}

fn check_timestamp(timestamp: f64) -> Result<(), OverlayError> {
    if timestamp.is_finite() {
        Ok(())
    } else {
        Err(OverlayError::InvalidTimestamp(timestamp))
    }
}

impl<E> Overlay<E> {
    pub fn kind(&self) -> OverlayKind {
        match self {
            Self::EntrySelected { .. } => OverlayKind::EntrySelected,
            Self::EntryLabel { .. } => OverlayKind::EntryLabel,
            Self::TimeRange { .. } => OverlayKind::TimeRange,
            Self::TimespanBreakdown { .. } => OverlayKind::TimespanBreakdown,
            Self::TimestampMarker { .. } => OverlayKind::TimestampMarker,
        }
    }

    /// The entry this overlay is anchored to, if any.
    pub fn entry(&self) -> Option<&E> {
        match self {
            Self::EntrySelected { entry } | Self::EntryLabel { entry, .. } => Some(entry),
            Self::TimespanBreakdown { entry, .. } => entry.as_ref(),
            Self::TimeRange { .. } | Self::TimestampMarker { .. } => None,
        }
    }

    /// Reject values no layout can place. Window-typed fields are already
    /// validated on construction.
    pub(crate) fn validate(&self) -> Result<(), OverlayError> {
        match self {
            Self::TimestampMarker { timestamp } => check_timestamp(*timestamp),
            _ => Ok(()),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::EntryLabel { label, .. } | Self::TimeRange { label, .. } => Some(label),
            _ => None,
        }
    }
}

/// Partial update for [`Overlay`]; `None` fields are left untouched. Missing
/// JSON fields deserialize as `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayPatch<E> {
    pub entry: Option<E>,
    pub label: Option<String>,
    pub bounds: Option<TimeWindow>,
    pub show_duration: Option<bool>,
    pub sections: Option<Vec<BreakdownSection>>,
    pub timestamp: Option<f64>,
}

impl<E> Default for OverlayPatch<E> {
    fn default() -> Self {
        Self {
            entry: None,
            label: None,
            bounds: None,
            show_duration: None,
            sections: None,
            timestamp: None,
        }
    }
}

impl<E> OverlayPatch<E> {
    pub fn bounds(bounds: TimeWindow) -> Self {
        Self {
            bounds: Some(bounds),
            ..Self::default()
        }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::default()
        }
    }

    pub fn entry(entry: E) -> Self {
        Self {
            entry: Some(entry),
            ..Self::default()
        }
    }

    pub fn timestamp(timestamp: f64) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    /// Check every set field exists on `kind` before anything is written.
    pub(crate) fn check_applies_to(&self, kind: OverlayKind) -> Result<(), OverlayError> {
        use OverlayKind as K;
        let fields: [(&'static str, bool, &[OverlayKind]); 6] = [
            (
                "entry",
                self.entry.is_some(),
                &[K::EntrySelected, K::EntryLabel, K::TimespanBreakdown],
            ),
            ("label", self.label.is_some(), &[K::EntryLabel, K::TimeRange]),
            ("bounds", self.bounds.is_some(), &[K::TimeRange]),
            ("show_duration", self.show_duration.is_some(), &[K::TimeRange]),
            ("sections", self.sections.is_some(), &[K::TimespanBreakdown]),
            ("timestamp", self.timestamp.is_some(), &[K::TimestampMarker]),
        ];
        for (field, set, allowed) in fields {
            if set && !allowed.contains(&kind) {
                return Err(OverlayError::PatchMismatch { kind, field });
            }
        }
        self.timestamp.map_or(Ok(()), check_timestamp)
    }

    /// Merge into `overlay`. Call [`Self::check_applies_to`] first.
    pub(crate) fn apply(self, overlay: &mut Overlay<E>) {
        match overlay {
            Overlay::EntrySelected { entry } => {
                if let Some(e) = self.entry {
                    *entry = e;
                }
            }
            Overlay::EntryLabel { entry, label } => {
                if let Some(e) = self.entry {
                    *entry = e;
                }
                if let Some(l) = self.label {
                    *label = l;
                }
            }
            Overlay::TimeRange {
                bounds,
                label,
                show_duration,
            } => {
                if let Some(b) = self.bounds {
                    *bounds = b;
                }
                if let Some(l) = self.label {
                    *label = l;
                }
                if let Some(s) = self.show_duration {
                    *show_duration = s;
                }
            }
            Overlay::TimespanBreakdown { sections, entry } => {
                if let Some(s) = self.sections {
                    *sections = s;
                }
                if let Some(e) = self.entry {
                    *entry = Some(e);
                }
            }
            Overlay::TimestampMarker { timestamp } => {
                if let Some(t) = self.timestamp {
                    *timestamp = t;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(min: f64, max: f64) -> TimeWindow {
        TimeWindow::new(min, max).expect("valid window")
    }

    #[test]
    fn json_uses_type_tag() {
        let overlay: Overlay<u64> =
            serde_json::from_str(r#"{"type":"ENTRY_LABEL","entry":4,"label":"slow"}"#)
                .expect("parse");
        assert_eq!(
            overlay,
            Overlay::EntryLabel {
                entry: 4,
                label: "slow".into()
            }
        );
        assert_eq!(overlay.kind(), OverlayKind::EntryLabel);
        assert_eq!(overlay.entry(), Some(&4));
    }

    #[test]
    fn time_range_defaults() {
        let overlay: Overlay<u64> =
            serde_json::from_str(r#"{"type":"TIME_RANGE","bounds":{"min":1,"max":2}}"#)
                .expect("parse");
        assert_eq!(
            overlay,
            Overlay::TimeRange {
                bounds: window(1.0, 2.0),
                label: String::new(),
                show_duration: false,
            }
        );
        assert_eq!(overlay.entry(), None);
    }

    #[test]
    fn patch_updates_only_set_fields() {
        let mut overlay: Overlay<u64> = Overlay::TimeRange {
            bounds: window(0.0, 10.0),
            label: "load".into(),
            show_duration: true,
        };
        let patch = OverlayPatch::bounds(window(2.0, 10.0));
        patch
            .check_applies_to(overlay.kind())
            .expect("bounds apply to time ranges");
        patch.apply(&mut overlay);
        assert_eq!(
            overlay,
            Overlay::TimeRange {
                bounds: window(2.0, 10.0),
                label: "load".into(),
                show_duration: true,
            }
        );
    }

    #[test]
    fn patch_rejects_foreign_fields() {
        let patch: OverlayPatch<u64> = OverlayPatch::label("nope");
        assert_eq!(
            patch.check_applies_to(OverlayKind::EntrySelected),
            Err(OverlayError::PatchMismatch {
                kind: OverlayKind::EntrySelected,
                field: "label",
            })
        );
        let patch: OverlayPatch<u64> = OverlayPatch::timestamp(3.0);
        assert!(patch.check_applies_to(OverlayKind::TimeRange).is_err());
        assert!(patch.check_applies_to(OverlayKind::TimestampMarker).is_ok());
    }

    #[test]
    fn non_finite_timestamps_are_rejected() {
        let marker: Overlay<u64> = Overlay::TimestampMarker {
            timestamp: f64::NAN,
        };
        assert!(matches!(
            marker.validate(),
            Err(OverlayError::InvalidTimestamp(_))
        ));
        let patch: OverlayPatch<u64> = OverlayPatch::timestamp(f64::INFINITY);
        assert_eq!(
            patch.check_applies_to(OverlayKind::TimestampMarker),
            Err(OverlayError::InvalidTimestamp(f64::INFINITY))
        );
    }
}
