//! Overlay → node layout.
//!
//! Pure: the same overlay, geometry and window always give the same layout,
//! which is what lets the registry skip renderer writes for unchanged nodes.

use timeline_overlays_protocol::{NodeContent, NodeLayout, Rect, SectionContent};

use crate::coords::{CoordinateResolver, width_for_duration, x_pixel_for_time};
use crate::error::OverlayError;
use crate::format::format_duration;
use crate::geometry::PaneId;
use crate::overlay::{BreakdownSection, Overlay};
use crate::provider::EntryGeometryProvider;

/// Height of a timespan breakdown strip.
const BREAKDOWN_ROW_PX: f64 = 18.0;

/// Pane whose width the time axis of time-anchored overlays follows.
const TIME_AXIS_PANE: PaneId = PaneId::Main;

pub(crate) fn layout_overlay<P: EntryGeometryProvider>(
    resolver: &CoordinateResolver<'_, P>,
    overlay: &Overlay<P::Entry>,
    editing: bool,
) -> Result<NodeLayout, OverlayError> {
    match overlay {
        Overlay::EntrySelected { entry } => entry_layout(resolver, entry, NodeContent::Outline),
        Overlay::EntryLabel { entry, label } => entry_layout(
            resolver,
            entry,
            NodeContent::Label {
                text: label.clone(),
                editing,
            },
        ),
        Overlay::TimeRange {
            bounds,
            label,
            show_duration,
        } => {
            let window = resolver.window()?;
            let width = resolver.geometry.require(TIME_AXIS_PANE)?.width_pixels;
            let rect = Rect::new(
                x_pixel_for_time(bounds.min(), window, width),
                0.0,
                width_for_duration(bounds.range(), window, width),
                resolver.geometry.total_height(),
            );
            Ok(NodeLayout {
                rect,
                visible: bounds.overlaps(window),
                content: NodeContent::Range {
                    label: label.clone(),
                    duration: show_duration.then(|| format_duration(bounds.range())),
                },
            })
        }
        Overlay::TimespanBreakdown { sections, entry } => {
            breakdown_layout(resolver, sections, entry.as_ref())
        }
        Overlay::TimestampMarker { timestamp } => {
            let window = resolver.window()?;
            let width = resolver.geometry.require(TIME_AXIS_PANE)?.width_pixels;
            Ok(NodeLayout {
                rect: Rect::new(
                    x_pixel_for_time(*timestamp, window, width),
                    0.0,
                    0.0,
                    resolver.geometry.total_height(),
                ),
                visible: window.contains(*timestamp),
                content: NodeContent::Marker {
                    timestamp: format_duration(timestamp - window.min()),
                },
            })
        }
    }
}

/// Bounding box of an entry in whole-chart coordinates. `None` when the
/// entry's level is hidden or the provider no longer knows the entry.
fn entry_rect<P: EntryGeometryProvider>(
    resolver: &CoordinateResolver<'_, P>,
    entry: &P::Entry,
) -> Result<Option<Rect>, OverlayError> {
    let y = match resolver.y_pixel_for_entry(entry)? {
        Some(y) => y,
        None => return Ok(None),
    };
    let (x, w) = match (
        resolver.x_pixel_for_entry(entry),
        resolver.width_for_entry(entry),
    ) {
        (Ok(x), Ok(w)) => (x, w),
        (Err(OverlayError::UnresolvedEntry), _) | (_, Err(OverlayError::UnresolvedEntry)) => {
            log::warn!("overlay entry {entry:?} is unknown to the geometry provider; hiding it");
            return Ok(None);
        }
        (Err(e), _) | (_, Err(e)) => return Err(e),
    };
    Ok(Some(Rect::new(x, y, w, resolver.provider.entry_height(entry))))
}

/// Whether `rect` shows inside the band of the chart that `pane` occupies.
fn visible_in_pane<P: EntryGeometryProvider>(
    resolver: &CoordinateResolver<'_, P>,
    pane: PaneId,
    rect: &Rect,
) -> Result<bool, OverlayError> {
    let dims = resolver.geometry.require(pane)?;
    let top = resolver.geometry.stacking_offset(pane)?;
    let bottom = top + dims.height_pixels;
    Ok(rect.intersects_span(dims.width_pixels) && rect.bottom() >= top && rect.y <= bottom)
}

fn entry_layout<P: EntryGeometryProvider>(
    resolver: &CoordinateResolver<'_, P>,
    entry: &P::Entry,
    content: NodeContent,
) -> Result<NodeLayout, OverlayError> {
    let Some(rect) = entry_rect(resolver, entry)? else {
        return Ok(NodeLayout::hidden(content));
    };
    let visible = visible_in_pane(resolver, resolver.provider.entry_pane(entry), &rect)?;
    Ok(NodeLayout {
        rect,
        visible,
        content,
    })
}

fn breakdown_layout<P: EntryGeometryProvider>(
    resolver: &CoordinateResolver<'_, P>,
    sections: &[BreakdownSection],
    entry: Option<&P::Entry>,
) -> Result<NodeLayout, OverlayError> {
    let window = resolver.window()?;
    let width = resolver.geometry.require(TIME_AXIS_PANE)?.width_pixels;

    let y = match entry {
        Some(entry) => match entry_rect(resolver, entry)? {
            Some(rect) => rect.bottom(),
            None => {
                return Ok(NodeLayout::hidden(NodeContent::Breakdown {
                    sections: Vec::new(),
                }));
            }
        },
        None => (resolver.geometry.total_height() - BREAKDOWN_ROW_PX).max(0.0),
    };

    let laid_out: Vec<SectionContent> = sections
        .iter()
        .map(|section| SectionContent {
            rect: Rect::new(
                x_pixel_for_time(section.bounds.min(), window, width),
                y,
                width_for_duration(section.bounds.range(), window, width),
                BREAKDOWN_ROW_PX,
            ),
            label: section.label.clone(),
            duration: section
                .show_duration
                .then(|| format_duration(section.bounds.range())),
        })
        .collect();

    let Some(rect) = laid_out
        .iter()
        .map(|s| s.rect)
        .reduce(|acc, r| acc.union(&r))
    else {
        return Ok(NodeLayout::hidden(NodeContent::Breakdown {
            sections: laid_out,
        }));
    };

    Ok(NodeLayout {
        rect,
        visible: sections.iter().any(|s| s.bounds.overlaps(window)),
        content: NodeContent::Breakdown { sections: laid_out },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ChartGeometry, PaneDimensions};
    use crate::scenario::{EntryRecord, TableProvider};
    use crate::window::TimeWindow;

    fn geometry() -> ChartGeometry {
        let mut g = ChartGeometry::new(PaneId::Network, 8.0);
        g.update(PaneId::Main, PaneDimensions::new(1000.0, 500.0))
            .expect("valid dims");
        g.update(PaneId::Network, PaneDimensions::new(1000.0, 200.0))
            .expect("valid dims");
        g
    }

    fn window(min: f64, max: f64) -> TimeWindow {
        TimeWindow::new(min, max).expect("valid window")
    }

    #[test]
    fn entry_width_scales_with_window() {
        let provider = TableProvider::new(vec![
            EntryRecord::new(0, PaneId::Main, 10_000.0, 5_000.0).at_y(40.0),
        ]);
        let g = geometry();
        let w = window(10_000.0, 30_000.0);
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &g,
            window: Some(&w),
        };
        let layout = layout_overlay(&resolver, &Overlay::EntrySelected { entry: 0 }, false)
            .expect("layout");
        assert_eq!(layout.rect.x, 0.0);
        assert_eq!(layout.rect.w, 250.0);
        assert_eq!(layout.rect.y, 248.0);
        assert!(layout.visible);
        assert_eq!(layout.content, NodeContent::Outline);
    }

    #[test]
    fn hidden_level_hides_node() {
        let provider = TableProvider::new(vec![EntryRecord::new(0, PaneId::Main, 0.0, 10.0)]);
        let g = geometry();
        let w = window(0.0, 100.0);
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &g,
            window: Some(&w),
        };
        let layout = layout_overlay(&resolver, &Overlay::EntrySelected { entry: 0 }, false)
            .expect("layout");
        assert!(!layout.visible);
    }

    #[test]
    fn off_screen_entry_is_laid_out_but_hidden() {
        let provider = TableProvider::new(vec![
            EntryRecord::new(0, PaneId::Main, 500.0, 10.0).at_y(0.0),
        ]);
        let g = geometry();
        let w = window(0.0, 100.0);
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &g,
            window: Some(&w),
        };
        let layout = layout_overlay(&resolver, &Overlay::EntrySelected { entry: 0 }, false)
            .expect("layout");
        assert_eq!(layout.rect.x, 5000.0);
        assert!(!layout.visible);
    }

    #[test]
    fn unknown_entry_is_hidden_not_fatal() {
        let provider = TableProvider::new(Vec::new());
        let g = geometry();
        let w = window(0.0, 100.0);
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &g,
            window: Some(&w),
        };
        let layout = layout_overlay(
            &resolver,
            &Overlay::EntryLabel {
                entry: 42,
                label: "gone".into(),
            },
            false,
        )
        .expect("layout");
        assert!(!layout.visible);
    }

    #[test]
    fn time_range_spans_whole_chart_with_caption() {
        let provider = TableProvider::new(Vec::new());
        let g = geometry();
        let w = window(0.0, 2_000_000.0);
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &g,
            window: Some(&w),
        };
        let overlay: Overlay<u64> = Overlay::TimeRange {
            bounds: window(500_000.0, 1_760_000.0),
            label: "load".into(),
            show_duration: true,
        };
        let layout = layout_overlay(&resolver, &overlay, false).expect("layout");
        assert_eq!(layout.rect, Rect::new(250.0, 0.0, 630.0, 708.0));
        assert!(layout.visible);
        assert_eq!(
            layout.content,
            NodeContent::Range {
                label: "load".into(),
                duration: Some("1.26\u{a0}s".into()),
            }
        );
    }

    #[test]
    fn breakdown_sections_under_entry() {
        let provider = TableProvider::new(vec![
            EntryRecord::new(7, PaneId::Main, 0.0, 100.0)
                .at_y(10.0)
                .with_height(20.0),
        ]);
        let g = geometry();
        let w = window(0.0, 100.0);
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &g,
            window: Some(&w),
        };
        let overlay = Overlay::TimespanBreakdown {
            sections: vec![
                BreakdownSection {
                    bounds: window(0.0, 40.0),
                    label: "input delay".into(),
                    show_duration: false,
                },
                BreakdownSection {
                    bounds: window(40.0, 100.0),
                    label: "processing".into(),
                    show_duration: true,
                },
            ],
            entry: Some(7),
        };
        let layout = layout_overlay(&resolver, &overlay, false).expect("layout");
        assert_eq!(layout.rect, Rect::new(0.0, 238.0, 1000.0, BREAKDOWN_ROW_PX));
        let NodeContent::Breakdown { sections } = layout.content else {
            unreachable!("breakdown overlays produce breakdown content");
        };
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[1].rect.x, 400.0);
        assert_eq!(sections[1].duration.as_deref(), Some("60\u{a0}μs"));
    }

    #[test]
    fn marker_reports_offset_into_window() {
        let provider = TableProvider::new(Vec::new());
        let g = geometry();
        let w = window(1_000.0, 3_000.0);
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &g,
            window: Some(&w),
        };
        let overlay: Overlay<u64> = Overlay::TimestampMarker { timestamp: 2_500.0 };
        let layout = layout_overlay(&resolver, &overlay, false).expect("layout");
        assert_eq!(layout.rect.x, 750.0);
        assert_eq!(layout.rect.w, 0.0);
        assert_eq!(
            layout.content,
            NodeContent::Marker {
                timestamp: "1.5\u{a0}ms".into()
            }
        );
    }

    #[test]
    fn time_overlays_need_a_window() {
        let provider = TableProvider::new(Vec::new());
        let g = geometry();
        let resolver = CoordinateResolver {
            provider: &provider,
            geometry: &g,
            window: None,
        };
        let overlay: Overlay<u64> = Overlay::TimestampMarker { timestamp: 1.0 };
        assert_eq!(
            layout_overlay(&resolver, &overlay, false),
            Err(OverlayError::NoWindowSet)
        );
    }
}
