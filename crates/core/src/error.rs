use thiserror::Error;
use timeline_overlays_protocol::{OverlayId, OverlayKind};

use crate::geometry::PaneId;

/// Errors raised by the overlay engine.
///
/// All of them signal a mistake in the calling layer (wrong call order, stale
/// handle, malformed input). None is transient, and every operation that
/// returns one has left the engine state untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    #[error("invalid time range: max {max} is before min {min} or not finite")]
    InvalidRange { min: f64, max: f64 },
    #[error("invalid {field} for {pane} pane: {value}")]
    InvalidGeometry {
        pane: PaneId,
        field: &'static str,
        value: f64,
    },
    #[error("no visible window has been set")]
    NoWindowSet,
    #[error("{0} is not registered")]
    UnknownOverlay(OverlayId),
    #[error("no dimensions recorded for the {0} pane")]
    MissingDimensions(PaneId),
    #[error("entry is not known to the geometry provider")]
    UnresolvedEntry,
    #[error("timestamp must be finite, got {0}")]
    InvalidTimestamp(f64),
    #[error("{kind} overlays cannot be attached to this entry")]
    IneligibleEntry { kind: OverlayKind },
    #[error("{kind} overlays have no `{field}` field")]
    PatchMismatch {
        kind: OverlayKind,
        field: &'static str,
    },
}
