use std::collections::BTreeMap;
use std::io::stdout;
use std::time::Duration;

use anyhow::{Result, anyhow};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    buffer::Buffer,
    layout::Rect as Area,
    style::{Color, Style},
    widgets::Block,
};
use timeline_overlays_core::coords::width_for_duration;
use timeline_overlays_core::format::format_duration;
use timeline_overlays_core::{
    OverlayBackend, Overlays, PaneDimensions, PaneId, TableProvider, TimeWindow,
};
use timeline_overlays_protocol::{
    NodeContent, NodeLayout, OverlayId, OverlayKind, Rect, ThemeToken,
};

/// Chart pixels per terminal row. Horizontally one pixel is one column.
const ROW_PX: f64 = 17.0;
/// Height of the network pane while collapsed.
const COLLAPSED_NETWORK_PX: f64 = 34.0;
const ZOOM_STEP: f64 = 1.3;
const PAN_FRACTION: f64 = 0.1;

fn theme_to_color(token: ThemeToken) -> Color {
    match token {
        ThemeToken::SelectionOutline => Color::Green,
        ThemeToken::LabelBackground => Color::DarkGray,
        ThemeToken::LabelText => Color::White,
        ThemeToken::LabelEditingBorder => Color::Yellow,
        ThemeToken::RangeFill => Color::Rgb(40, 40, 90),
        ThemeToken::RangeBorder => Color::Rgb(80, 80, 160),
        ThemeToken::RangeText => Color::LightBlue,
        ThemeToken::BreakdownFill => Color::Rgb(60, 45, 20),
        ThemeToken::BreakdownBorder => Color::Rgb(200, 150, 60),
        ThemeToken::MarkerLine => Color::Rgb(200, 100, 100),
        ThemeToken::MarkerText => Color::LightRed,
    }
}

struct DrawnNode {
    kind: OverlayKind,
    layout: NodeLayout,
}

/// Keeps the latest layout of every node; the frame is painted from it.
#[derive(Default)]
pub struct TerminalBackend {
    nodes: BTreeMap<OverlayId, DrawnNode>,
}

impl OverlayBackend for TerminalBackend {
    type Node = OverlayId;

    fn create(&mut self, id: OverlayId, kind: OverlayKind, layout: &NodeLayout) -> OverlayId {
        self.nodes.insert(
            id,
            DrawnNode {
                kind,
                layout: layout.clone(),
            },
        );
        id
    }

    fn patch(&mut self, node: &mut OverlayId, layout: &NodeLayout) {
        if let Some(drawn) = self.nodes.get_mut(node) {
            drawn.layout = layout.clone();
        }
    }

    fn destroy(&mut self, node: OverlayId) {
        self.nodes.remove(&node);
    }
}

type Engine = Overlays<TableProvider, TerminalBackend>;

/// What the user has panned, zoomed and toggled so far.
struct View {
    window: TimeWindow,
    main: Option<PaneDimensions>,
    network: Option<PaneDimensions>,
    network_collapsed: bool,
    scroll_px: f64,
}

impl View {
    fn from_engine(engine: &Engine) -> Result<Self> {
        let window = match engine.visible_window() {
            Some(window) => *window,
            None => {
                let (min, max) = engine
                    .provider()
                    .extent()
                    .ok_or_else(|| anyhow!("scenario has neither a window nor entries"))?;
                TimeWindow::new(min, max)?
            }
        };
        let geometry = engine.geometry();
        let main = geometry.dimensions(PaneId::Main).copied();
        let network = geometry.dimensions(PaneId::Network).copied();
        let main = match (main, network) {
            (None, None) => Some(PaneDimensions::new(0.0, 20.0 * ROW_PX)),
            (main, _) => main,
        };
        Ok(Self {
            window,
            main,
            network,
            network_collapsed: network.is_some_and(|n| n.all_groups_collapsed),
            scroll_px: main.map_or(0.0, |m| m.scroll_offset_pixels),
        })
    }

    fn apply(&self, engine: &mut Engine, columns: u16) -> Result<()> {
        let width = f64::from(columns);
        if let Some(main) = self.main {
            engine.update_chart_dimensions(
                PaneId::Main,
                PaneDimensions {
                    width_pixels: width,
                    scroll_offset_pixels: self.scroll_px,
                    ..main
                },
            )?;
        }
        if let Some(network) = self.network {
            let dims = if self.network_collapsed {
                PaneDimensions {
                    width_pixels: width,
                    height_pixels: COLLAPSED_NETWORK_PX.min(network.height_pixels),
                    all_groups_collapsed: true,
                    ..network
                }
            } else {
                PaneDimensions {
                    width_pixels: width,
                    all_groups_collapsed: false,
                    ..network
                }
            };
            engine.update_chart_dimensions(PaneId::Network, dims)?;
        }
        engine.update_visible_window(self.window);
        Ok(())
    }

    fn pan(&mut self, fraction: f64) -> Result<()> {
        self.window = self.window.shifted(self.window.range() * fraction)?;
        Ok(())
    }

    fn zoom(&mut self, factor: f64) -> Result<()> {
        let center = self.window.min() + self.window.range() / 2.0;
        let half = self.window.range() / factor / 2.0;
        self.window = TimeWindow::new(center - half, center + half)?;
        Ok(())
    }
}

pub fn run(mut engine: Engine) -> Result<()> {
    let mut view = View::from_engine(&engine)?;

    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let result = event_loop(&mut terminal, &mut engine, &mut view);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    engine: &mut Engine,
    view: &mut View,
) -> Result<()> {
    loop {
        let size = terminal.size()?;
        view.apply(engine, size.width)?;
        let stats = engine.update()?;
        log::trace!("frame reconciled: {stats:?}");

        terminal.draw(|frame| draw(frame, engine, view))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Left => view.pan(-PAN_FRACTION)?,
            KeyCode::Right => view.pan(PAN_FRACTION)?,
            KeyCode::Char('+') | KeyCode::Char('=') => view.zoom(ZOOM_STEP)?,
            KeyCode::Char('-') => view.zoom(1.0 / ZOOM_STEP)?,
            KeyCode::Char('c') => view.network_collapsed = !view.network_collapsed,
            KeyCode::Up => view.scroll_px = (view.scroll_px - ROW_PX).max(0.0),
            KeyCode::Down => view.scroll_px += ROW_PX,
            _ => {}
        }
    }
    Ok(())
}

/// Map a chart-pixel rect onto the cells of `area`, clipped to it. Returns
/// `(x0, x1, y0, y1)` with exclusive ends; every rect covers at least one cell
/// when it overlaps the area.
fn to_cells(area: Area, rect: &Rect) -> Option<(u16, u16, u16, u16)> {
    let clamp = |v: f64, max: u16| v.clamp(0.0, f64::from(max)) as u16;
    let left = rect.x.floor();
    let top = (rect.y / ROW_PX).floor();
    let x0 = clamp(left, area.width);
    let x1 = clamp(rect.right().ceil().max(left + 1.0), area.width);
    let y0 = clamp(top, area.height);
    let y1 = clamp((rect.bottom() / ROW_PX).ceil().max(top + 1.0), area.height);
    (x0 < x1 && y0 < y1).then_some((area.x + x0, area.x + x1, area.y + y0, area.y + y1))
}

fn fill(buf: &mut Buffer, (x0, x1, y0, y1): (u16, u16, u16, u16), bg: Color) {
    for y in y0..y1 {
        for x in x0..x1 {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.set_bg(bg);
            }
        }
    }
}

fn caption(buf: &mut Buffer, area: Area, x: u16, y: u16, text: &str, style: Style) {
    let room = (area.x + area.width).saturating_sub(x);
    if room > 0 && y < area.y + area.height {
        let _ = buf.set_stringn(x, y, text, usize::from(room), style);
    }
}

fn with_duration(label: &str, duration: Option<&str>) -> String {
    match (label.is_empty(), duration) {
        (_, None) => label.to_owned(),
        (true, Some(d)) => d.to_owned(),
        (false, Some(d)) => format!("{label} {d}"),
    }
}

fn draw(frame: &mut Frame, engine: &Engine, view: &View) {
    let area = frame.area();

    let header_area = Area::new(area.x, area.y, area.width, 1);
    let header = Block::default()
        .title(format!(
            " timeline-overlays | {} overlays | {} visible | ←→ pan | +/- zoom | ↑↓ scroll | c network | q quit ",
            engine.len(),
            format_duration(view.window.range()),
        ))
        .style(Style::default().fg(Color::White).bg(Color::DarkGray));
    frame.render_widget(header, header_area);

    let chart = Area::new(
        area.x,
        area.y + 1,
        area.width,
        area.height.saturating_sub(1),
    );
    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Black)),
        chart,
    );
    let buf = frame.buffer_mut();

    draw_pane_divider(buf, chart, engine);
    draw_entries(buf, chart, engine, view);
    for node in engine.backend().nodes.values() {
        if node.layout.visible {
            draw_node(buf, chart, node);
        }
    }
}

fn draw_pane_divider(buf: &mut Buffer, chart: Area, engine: &Engine) {
    let geometry = engine.geometry();
    let bottom = geometry.top_pane().other();
    if geometry.dimensions(bottom).is_none() {
        return;
    }
    let Ok(offset) = geometry.stacking_offset(bottom) else {
        return;
    };
    let row = (offset / ROW_PX).floor() as u16;
    if row == 0 || row > chart.height {
        return;
    }
    let divider = "─".repeat(usize::from(chart.width));
    caption(
        buf,
        chart,
        chart.x,
        chart.y + row - 1,
        &divider,
        Style::default().fg(Color::DarkGray),
    );
}

fn draw_entries(buf: &mut Buffer, chart: Area, engine: &Engine, view: &View) {
    let style = Style::default().fg(Color::DarkGray);
    for record in engine.provider().records() {
        let (Ok(x), Ok(Some(y))) = (
            engine.x_pixel_for_event_on_chart(&record.id),
            engine.y_pixel_for_event_on_chart(&record.id),
        ) else {
            continue;
        };
        let geometry = engine.geometry();
        let (Some(dims), Ok(top)) = (
            geometry.dimensions(record.pane),
            geometry.stacking_offset(record.pane),
        ) else {
            continue;
        };
        if y < top || y >= top + dims.height_pixels {
            continue;
        }
        let w = width_for_duration(record.duration, &view.window, dims.width_pixels);
        let Some((x0, x1, y0, _)) = to_cells(chart, &Rect::new(x, y, w, record.height)) else {
            continue;
        };
        let bar = "▒".repeat(usize::from(x1 - x0));
        caption(buf, chart, x0, y0, &bar, style);
    }
}

fn draw_node(buf: &mut Buffer, chart: Area, node: &DrawnNode) {
    let rect = &node.layout.rect;
    let Some(cells) = to_cells(chart, rect) else {
        return;
    };
    let (x0, _, y0, y1) = cells;
    match &node.layout.content {
        NodeContent::Outline => {
            fill(buf, cells, theme_to_color(ThemeToken::for_kind(node.kind)));
        }
        NodeContent::Label { text, editing } => {
            let row = if y0 > chart.y { y0 - 1 } else { y0 };
            let (shown, fg) = if *editing {
                (format!("{text}▏"), ThemeToken::LabelEditingBorder)
            } else {
                (text.clone(), ThemeToken::LabelText)
            };
            let style = Style::default()
                .fg(theme_to_color(fg))
                .bg(theme_to_color(ThemeToken::LabelBackground));
            caption(buf, chart, x0, row, &shown, style);
        }
        NodeContent::Range { label, duration } => {
            fill(buf, cells, theme_to_color(ThemeToken::for_kind(node.kind)));
            let style = Style::default()
                .fg(theme_to_color(ThemeToken::RangeText))
                .bg(theme_to_color(ThemeToken::RangeBorder));
            caption(
                buf,
                chart,
                x0,
                y0,
                &with_duration(label, duration.as_deref()),
                style,
            );
        }
        NodeContent::Breakdown { sections } => {
            let style = Style::default().fg(theme_to_color(ThemeToken::BreakdownBorder));
            for section in sections {
                let Some(section_cells) = to_cells(chart, &section.rect) else {
                    continue;
                };
                fill(
                    buf,
                    section_cells,
                    theme_to_color(ThemeToken::BreakdownFill),
                );
                let text = with_duration(&section.label, section.duration.as_deref());
                caption(buf, chart, section_cells.0, section_cells.2, &text, style);
            }
        }
        NodeContent::Marker { timestamp } => {
            let line = Style::default().fg(theme_to_color(ThemeToken::MarkerLine));
            for y in y0..y1 {
                caption(buf, chart, x0, y, "│", line);
            }
            let text = Style::default().fg(theme_to_color(ThemeToken::MarkerText));
            caption(buf, chart, x0 + 1, y0, timestamp, text);
        }
    }
}
