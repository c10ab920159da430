use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Discriminant of an overlay. Serialized in the same `SCREAMING_SNAKE_CASE`
/// form used as the `type` tag of overlay JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverlayKind {
    EntrySelected,
    EntryLabel,
    TimeRange,
    TimespanBreakdown,
    TimestampMarker,
}

impl OverlayKind {
    pub const ALL: [OverlayKind; 5] = [
        Self::EntrySelected,
        Self::EntryLabel,
        Self::TimeRange,
        Self::TimespanBreakdown,
        Self::TimestampMarker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EntrySelected => "ENTRY_SELECTED",
            Self::EntryLabel => "ENTRY_LABEL",
            Self::TimeRange => "TIME_RANGE",
            Self::TimespanBreakdown => "TIMESPAN_BREAKDOWN",
            Self::TimestampMarker => "TIMESTAMP_MARKER",
        }
    }
}

impl std::fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OverlayKind {
    type Err = UnknownOverlayKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownOverlayKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown overlay kind: {0}")]
pub struct UnknownOverlayKind(pub String);
