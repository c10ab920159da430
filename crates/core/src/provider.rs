use crate::geometry::PaneId;

/// Geometry of trace entries, supplied by the flame-chart layer.
///
/// The engine never looks inside an entry: it only passes the handle back to
/// these lookups. Handle equality must mean "same entry in the trace model"
/// (an event index, an `Rc` compared by pointer, ...), because
/// `overlays_for_entry` matches overlays through it.
pub trait EntryGeometryProvider {
    type Entry: Clone + PartialEq + std::fmt::Debug;

    /// Start timestamp in microseconds, or `None` for an unknown entry.
    fn entry_start_time(&self, entry: &Self::Entry) -> Option<f64>;

    /// Duration in microseconds. Instant events report zero.
    fn entry_duration(&self, entry: &Self::Entry) -> Option<f64>;

    /// Which pane draws the entry.
    fn entry_pane(&self, entry: &Self::Entry) -> PaneId;

    /// Top of the entry's row inside its own pane, before scrolling. `None`
    /// when the renderer currently hides the entry's level (collapsed group).
    fn entry_y_within_pane(&self, entry: &Self::Entry) -> Option<f64>;

    /// Height of the entry's row in pixels.
    fn entry_height(&self, entry: &Self::Entry) -> f64;

    /// Whether the entry is a synthetic frame record rather than a trace event.
    fn is_frame_entry(&self, entry: &Self::Entry) -> bool;
}
