use serde::{Deserialize, Serialize};

use crate::kind::OverlayKind;

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    SelectionOutline,

    LabelBackground,
    LabelText,
    LabelEditingBorder,

    RangeFill,
    RangeBorder,
    RangeText,

    BreakdownFill,
    BreakdownBorder,

    MarkerLine,
    MarkerText,
}

impl ThemeToken {
    /// Primary token used to paint a node of the given kind.
    pub fn for_kind(kind: OverlayKind) -> Self {
        match kind {
            OverlayKind::EntrySelected => Self::SelectionOutline,
            OverlayKind::EntryLabel => Self::LabelBackground,
            OverlayKind::TimeRange => Self::RangeFill,
            OverlayKind::TimespanBreakdown => Self::BreakdownFill,
            OverlayKind::TimestampMarker => Self::MarkerLine,
        }
    }
}
