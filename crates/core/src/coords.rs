//! Pixel mapping for times and entries.
//!
//! Nothing here clips: an entry before the window gets a negative x and an
//! entry after it gets an x past the pane width. Callers decide visibility.

use crate::error::OverlayError;
use crate::geometry::ChartGeometry;
use crate::provider::EntryGeometryProvider;
use crate::window::TimeWindow;

/// Map a timestamp onto a pane `width` pixels wide showing `window`.
///
/// A zero-length window puts everything at or before its instant on the left
/// edge and everything later on the right edge.
pub fn x_pixel_for_time(ts: f64, window: &TimeWindow, width: f64) -> f64 {
    if window.range() <= 0.0 {
        return if ts <= window.min() { 0.0 } else { width };
    }
    (ts - window.min()) / window.range() * width
}

/// Pixel width of `duration` microseconds.
pub fn width_for_duration(duration: f64, window: &TimeWindow, width: f64) -> f64 {
    if window.range() <= 0.0 {
        return 0.0;
    }
    duration / window.range() * width
}

/// Borrowed view over everything needed to place an entry.
pub struct CoordinateResolver<'a, P: EntryGeometryProvider> {
    pub provider: &'a P,
    pub geometry: &'a ChartGeometry,
    pub window: Option<&'a TimeWindow>,
}

impl<P: EntryGeometryProvider> CoordinateResolver<'_, P> {
    pub fn window(&self) -> Result<&TimeWindow, OverlayError> {
        self.window.ok_or(OverlayError::NoWindowSet)
    }

    /// Left edge of the entry, in the coordinates of its own pane.
    pub fn x_pixel_for_entry(&self, entry: &P::Entry) -> Result<f64, OverlayError> {
        let window = self.window()?;
        let pane = self.provider.entry_pane(entry);
        let width = self.geometry.require(pane)?.width_pixels;
        let start = self
            .provider
            .entry_start_time(entry)
            .ok_or(OverlayError::UnresolvedEntry)?;
        Ok(x_pixel_for_time(start, window, width))
    }

    /// Top edge of the entry's row in whole-chart coordinates, or `None` when
    /// its level is hidden.
    pub fn y_pixel_for_entry(&self, entry: &P::Entry) -> Result<Option<f64>, OverlayError> {
        let pane = self.provider.entry_pane(entry);
        let dims = self.geometry.require(pane)?;
        let offset = self.geometry.stacking_offset(pane)?;
        Ok(self
            .provider
            .entry_y_within_pane(entry)
            .map(|y| y - dims.scroll_offset_pixels + offset))
    }

    /// Width of the entry's span in pixels.
    pub fn width_for_entry(&self, entry: &P::Entry) -> Result<f64, OverlayError> {
        let window = self.window()?;
        let pane = self.provider.entry_pane(entry);
        let width = self.geometry.require(pane)?.width_pixels;
        let duration = self
            .provider
            .entry_duration(entry)
            .ok_or(OverlayError::UnresolvedEntry)?;
        Ok(width_for_duration(duration, window, width))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{PaneDimensions, PaneId};
    use crate::scenario::{EntryRecord, TableProvider};

    fn window(min: f64, max: f64) -> TimeWindow {
        TimeWindow::new(min, max).expect("valid window")
    }

    #[test]
    fn maps_window_edges_to_pane_edges() {
        let w = window(1_000.0, 3_000.0);
        assert_eq!(x_pixel_for_time(1_000.0, &w, 640.0), 0.0);
        assert!((x_pixel_for_time(3_000.0, &w, 640.0) - 640.0).abs() < 1e-9);
        assert!((x_pixel_for_time(2_000.0, &w, 640.0) - 320.0).abs() < 1e-9);
    }

    #[test]
    fn does_not_clip_out_of_window_times() {
        let w = window(100.0, 200.0);
        assert_eq!(x_pixel_for_time(50.0, &w, 100.0), -50.0);
        assert_eq!(x_pixel_for_time(300.0, &w, 100.0), 200.0);
    }

    #[test]
    fn zero_length_window_is_finite() {
        let w = window(5.0, 5.0);
        assert_eq!(x_pixel_for_time(5.0, &w, 100.0), 0.0);
        assert_eq!(x_pixel_for_time(6.0, &w, 100.0), 100.0);
        assert_eq!(width_for_duration(10.0, &w, 100.0), 0.0);
    }

    #[test]
    fn entry_x_uses_entry_start() {
        let provider = TableProvider::new(vec![EntryRecord::new(0, PaneId::Main, 50.0, 0.0)]);
        let mut geometry = ChartGeometry::new(PaneId::Network, 8.0);
        geometry
            .update(PaneId::Main, PaneDimensions::new(100.0, 50.0))
            .expect("valid dims");
        let w = window(0.0, 100.0);
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &geometry,
            window: Some(&w),
        };
        assert_eq!(resolver.x_pixel_for_entry(&0), Ok(50.0));
        assert_eq!(resolver.x_pixel_for_entry(&9), Err(OverlayError::UnresolvedEntry));
    }

    #[test]
    fn entry_x_requires_window() {
        let provider = TableProvider::new(vec![EntryRecord::new(0, PaneId::Main, 50.0, 0.0)]);
        let geometry = ChartGeometry::new(PaneId::Network, 8.0);
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &geometry,
            window: None,
        };
        assert_eq!(resolver.x_pixel_for_entry(&0), Err(OverlayError::NoWindowSet));
    }

    #[test]
    fn entry_y_subtracts_own_scroll() {
        let provider = TableProvider::new(vec![
            EntryRecord::new(0, PaneId::Main, 0.0, 0.0).at_y(233.0),
            EntryRecord::new(1, PaneId::Network, 0.0, 0.0).at_y(34.0),
        ]);
        let mut geometry = ChartGeometry::new(PaneId::Network, 8.0);
        geometry
            .update(
                PaneId::Main,
                PaneDimensions {
                    scroll_offset_pixels: 33.0,
                    ..PaneDimensions::new(1000.0, 500.0)
                },
            )
            .expect("valid dims");
        geometry
            .update(PaneId::Network, PaneDimensions::new(1000.0, 200.0))
            .expect("valid dims");
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &geometry,
            window: None,
        };
        assert_eq!(resolver.y_pixel_for_entry(&0), Ok(Some(408.0)));
        assert_eq!(resolver.y_pixel_for_entry(&1), Ok(Some(34.0)));
    }
}
