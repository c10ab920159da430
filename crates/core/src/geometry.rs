use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

/// One of the two independently scrollable chart surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaneId {
    Main,
    Network,
}

impl PaneId {
    pub fn other(self) -> Self {
        match self {
            Self::Main => Self::Network,
            Self::Network => Self::Main,
        }
    }
}

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Main => write!(f, "main"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Last reported size and scroll state of one pane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaneDimensions {
    pub width_pixels: f64,
    pub height_pixels: f64,
    pub scroll_offset_pixels: f64,
    pub all_groups_collapsed: bool,
}

impl PaneDimensions {
    pub fn new(width_pixels: f64, height_pixels: f64) -> Self {
        Self {
            width_pixels,
            height_pixels,
            scroll_offset_pixels: 0.0,
            all_groups_collapsed: false,
        }
    }

    fn validate(&self, pane: PaneId) -> Result<(), OverlayError> {
        let fields = [
            ("width_pixels", self.width_pixels),
            ("height_pixels", self.height_pixels),
            ("scroll_offset_pixels", self.scroll_offset_pixels),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(OverlayError::InvalidGeometry { pane, field, value });
            }
        }
        Ok(())
    }
}

/// Tracks the dimensions of both panes and derives how they stack.
///
/// The two panes are laid out vertically, `top_pane` first, with a resize
/// handle between them that is only shown while the top pane is expanded.
#[derive(Debug, Clone)]
pub struct ChartGeometry {
    main: Option<PaneDimensions>,
    network: Option<PaneDimensions>,
    top_pane: PaneId,
    resize_handle_px: f64,
}

impl ChartGeometry {
    pub fn new(top_pane: PaneId, resize_handle_px: f64) -> Self {
        Self {
            main: None,
            network: None,
            top_pane,
            resize_handle_px,
        }
    }

    /// Replace the stored dimensions of `pane`. Nothing is stored on error.
    pub fn update(&mut self, pane: PaneId, dims: PaneDimensions) -> Result<(), OverlayError> {
        dims.validate(pane)?;
        match pane {
            PaneId::Main => self.main = Some(dims),
            PaneId::Network => self.network = Some(dims),
        }
        Ok(())
    }

    pub fn dimensions(&self, pane: PaneId) -> Option<&PaneDimensions> {
        match pane {
            PaneId::Main => self.main.as_ref(),
            PaneId::Network => self.network.as_ref(),
        }
    }

    pub fn require(&self, pane: PaneId) -> Result<&PaneDimensions, OverlayError> {
        self.dimensions(pane)
            .ok_or(OverlayError::MissingDimensions(pane))
    }

    pub fn top_pane(&self) -> PaneId {
        self.top_pane
    }

    /// Vertical distance from the top of the chart to the top of `pane`.
    ///
    /// The bottom pane is pushed down by the full height of the top pane, plus
    /// the resize handle while both panes are expanded.
    pub fn stacking_offset(&self, pane: PaneId) -> Result<f64, OverlayError> {
        if pane == self.top_pane {
            return Ok(0.0);
        }
        let top = self.require(self.top_pane)?;
        Ok(top.height_pixels + self.handle_allowance(top, self.dimensions(pane)))
    }

    /// Height of both panes plus the handle between them. Panes without
    /// dimensions contribute nothing.
    pub fn total_height(&self) -> f64 {
        let top = self.dimensions(self.top_pane);
        let bottom = self.dimensions(self.top_pane.other());
        let handle = match (top, bottom) {
            (Some(top), Some(bottom)) => self.handle_allowance(top, Some(bottom)),
            _ => 0.0,
        };
        top.map_or(0.0, |d| d.height_pixels) + handle + bottom.map_or(0.0, |d| d.height_pixels)
    }

    /// No handle is drawn when either pane is collapsed or the top pane is
    /// empty. A bottom pane with no recorded dimensions counts as expanded.
    fn handle_allowance(&self, top: &PaneDimensions, bottom: Option<&PaneDimensions>) -> f64 {
        let collapsed =
            top.all_groups_collapsed || bottom.is_some_and(|b| b.all_groups_collapsed);
        if collapsed || top.height_pixels <= 0.0 {
            0.0
        } else {
            self.resize_handle_px
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(network_height: f64, network_collapsed: bool) -> ChartGeometry {
        let mut g = ChartGeometry::new(PaneId::Network, 8.0);
        g.update(PaneId::Main, PaneDimensions::new(1000.0, 500.0))
            .expect("valid dims");
        g.update(
            PaneId::Network,
            PaneDimensions {
                all_groups_collapsed: network_collapsed,
                ..PaneDimensions::new(1000.0, network_height)
            },
        )
        .expect("valid dims");
        g
    }

    #[test]
    fn top_pane_has_no_offset() {
        let g = geometry(200.0, false);
        assert_eq!(g.stacking_offset(PaneId::Network), Ok(0.0));
    }

    #[test]
    fn bottom_pane_includes_handle_when_expanded() {
        let g = geometry(200.0, false);
        assert_eq!(g.stacking_offset(PaneId::Main), Ok(208.0));
    }

    #[test]
    fn collapsed_top_pane_drops_handle() {
        let g = geometry(34.0, true);
        assert_eq!(g.stacking_offset(PaneId::Main), Ok(34.0));
    }

    #[test]
    fn collapsed_bottom_pane_drops_handle() {
        let mut g = geometry(200.0, false);
        g.update(
            PaneId::Main,
            PaneDimensions {
                all_groups_collapsed: true,
                ..PaneDimensions::new(1000.0, 500.0)
            },
        )
        .expect("valid dims");
        assert_eq!(g.stacking_offset(PaneId::Main), Ok(200.0));
        assert_eq!(g.total_height(), 700.0);
    }

    #[test]
    fn empty_top_pane_has_no_handle() {
        let g = geometry(0.0, false);
        assert_eq!(g.stacking_offset(PaneId::Main), Ok(0.0));
        assert_eq!(g.total_height(), 500.0);
    }

    #[test]
    fn offset_follows_every_update() {
        let mut g = geometry(200.0, false);
        assert_eq!(g.stacking_offset(PaneId::Main), Ok(208.0));
        g.update(
            PaneId::Network,
            PaneDimensions {
                all_groups_collapsed: true,
                ..PaneDimensions::new(1000.0, 34.0)
            },
        )
        .expect("valid dims");
        assert_eq!(g.stacking_offset(PaneId::Main), Ok(34.0));
    }

    #[test]
    fn main_on_top_is_configurable() {
        let mut g = ChartGeometry::new(PaneId::Main, 8.0);
        g.update(PaneId::Main, PaneDimensions::new(1000.0, 300.0))
            .expect("valid dims");
        assert_eq!(g.stacking_offset(PaneId::Main), Ok(0.0));
        assert_eq!(g.stacking_offset(PaneId::Network), Ok(308.0));
    }

    #[test]
    fn missing_top_pane_is_reported() {
        let g = ChartGeometry::new(PaneId::Network, 8.0);
        assert_eq!(
            g.stacking_offset(PaneId::Main),
            Err(OverlayError::MissingDimensions(PaneId::Network))
        );
    }

    #[test]
    fn negative_dimensions_are_rejected_without_mutation() {
        let mut g = geometry(200.0, false);
        let err = g
            .update(
                PaneId::Network,
                PaneDimensions {
                    scroll_offset_pixels: -1.0,
                    ..PaneDimensions::new(10.0, 10.0)
                },
            )
            .expect_err("negative scroll offset");
        assert!(matches!(
            err,
            OverlayError::InvalidGeometry {
                pane: PaneId::Network,
                field: "scroll_offset_pixels",
                ..
            }
        ));
        assert_eq!(
            g.dimensions(PaneId::Network).map(|d| d.height_pixels),
            Some(200.0)
        );
    }

    #[test]
    fn total_height_stacks_both_panes() {
        assert_eq!(geometry(200.0, false).total_height(), 708.0);
        assert_eq!(geometry(34.0, true).total_height(), 534.0);
    }
}
