//! Self-contained overlay scenarios: a table of entries, pane sizes, a window
//! and the overlays to draw, all in one JSON document.
//!
//! ```json
//! {
//!   "panes": {"main": {...}, "network": {...}},
//!   "window": {"min": 0, "max": 20000},
//!   "entries": [{"id": 1, "start": 1000, "duration": 500, "pane": "main", "y": 233}],
//!   "overlays": [{"type": "ENTRY_SELECTED", "entry": 1}]
//! }
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::OverlayBackend;
use crate::config::{ConfigError, OverlayConfig};
use crate::error::OverlayError;
use crate::geometry::{PaneDimensions, PaneId};
use crate::overlay::Overlay;
use crate::provider::EntryGeometryProvider;
use crate::registry::Overlays;
use crate::window::TimeWindow;

/// Row height used when an entry does not specify one.
pub const DEFAULT_ENTRY_HEIGHT: f64 = 17.0;

fn default_height() -> f64 {
    DEFAULT_ENTRY_HEIGHT
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("invalid scenario JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Overlay(#[from] OverlayError),
}

/// One row of the entry table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: u64,
    pub start: f64,
    pub duration: f64,
    pub pane: PaneId,
    /// Top of the row inside its pane; absent when the row's level is hidden.
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default)]
    pub frame: bool,
}

impl EntryRecord {
    pub fn new(id: u64, pane: PaneId, start: f64, duration: f64) -> Self {
        Self {
            id,
            start,
            duration,
            pane,
            y: None,
            height: DEFAULT_ENTRY_HEIGHT,
            frame: false,
        }
    }

    pub fn at_y(mut self, y: f64) -> Self {
        self.y = Some(y);
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn frame(mut self) -> Self {
        self.frame = true;
        self
    }
}

/// [`EntryGeometryProvider`] backed by an in-memory table keyed by entry id.
#[derive(Debug, Clone, Default)]
pub struct TableProvider {
    entries: HashMap<u64, EntryRecord>,
}

impl TableProvider {
    pub fn new(records: Vec<EntryRecord>) -> Self {
        Self {
            entries: records.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    pub fn get(&self, id: u64) -> Option<&EntryRecord> {
        self.entries.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &EntryRecord> {
        self.entries.values()
    }

    /// Time span covered by all entries, if there are any.
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.records().fold(None, |acc, r| {
            let (lo, hi) = acc.unwrap_or((r.start, r.start + r.duration));
            Some((lo.min(r.start), hi.max(r.start + r.duration)))
        })
    }

    pub fn insert(&mut self, record: EntryRecord) -> Option<EntryRecord> {
        self.entries.insert(record.id, record)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl EntryGeometryProvider for TableProvider {
    type Entry = u64;

    fn entry_start_time(&self, entry: &u64) -> Option<f64> {
        self.get(*entry).map(|r| r.start)
    }

    fn entry_duration(&self, entry: &u64) -> Option<f64> {
        self.get(*entry).map(|r| r.duration)
    }

    fn entry_pane(&self, entry: &u64) -> PaneId {
        self.get(*entry).map_or(PaneId::Main, |r| r.pane)
    }

    fn entry_y_within_pane(&self, entry: &u64) -> Option<f64> {
        self.get(*entry).and_then(|r| r.y)
    }

    fn entry_height(&self, entry: &u64) -> f64 {
        self.get(*entry).map_or(DEFAULT_ENTRY_HEIGHT, |r| r.height)
    }

    fn is_frame_entry(&self, entry: &u64) -> bool {
        self.get(*entry).is_some_and(|r| r.frame)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPanes {
    pub main: Option<PaneDimensions>,
    pub network: Option<PaneDimensions>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub config: OverlayConfig,
    #[serde(default)]
    pub panes: ScenarioPanes,
    pub window: Option<TimeWindow>,
    #[serde(default)]
    pub entries: Vec<EntryRecord>,
    #[serde(default)]
    pub overlays: Vec<Overlay<u64>>,
}

pub fn parse_scenario(data: &[u8]) -> Result<Scenario, ScenarioError> {
    let scenario: Scenario = serde_json::from_slice(data)?;
    scenario.config.validate()?;
    Ok(scenario)
}

impl Scenario {
    /// Build an engine holding every overlay of the scenario. Nothing is
    /// rendered until the caller runs [`Overlays::update`].
    pub fn build<B: OverlayBackend>(
        self,
        backend: B,
    ) -> Result<Overlays<TableProvider, B>, ScenarioError> {
        let mut overlays = Overlays::new(TableProvider::new(self.entries), backend, self.config);
        for (pane, dims) in [
            (PaneId::Main, self.panes.main),
            (PaneId::Network, self.panes.network),
        ] {
            if let Some(dims) = dims {
                overlays.update_chart_dimensions(pane, dims)?;
            }
        }
        if let Some(window) = self.window {
            overlays.update_visible_window(window);
        }
        for overlay in self.overlays {
            overlays.add(overlay)?;
        }
        Ok(overlays)
    }
}
