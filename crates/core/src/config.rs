use serde::{Deserialize, Serialize};
use thiserror::Error;
use timeline_overlays_protocol::OverlayKind;

use crate::geometry::PaneId;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("resize_handle_px must be a finite, non-negative number, got {0}")]
    InvalidHandle(f64),
}

/// Tunables of the overlay engine. Every field has a default, so `{}` is a
/// valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Height of the drag handle drawn between the two panes.
    pub resize_handle_px: f64,
    pub stacking: StackingConfig,
    /// Overlay kinds allowed on synthetic frame entries.
    pub frame_eligible_kinds: Vec<OverlayKind>,
    pub labels: LabelConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StackingConfig {
    /// Pane drawn at the top of the chart.
    pub top_pane: PaneId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Drop an entry label whose text is blank when editing ends.
    pub remove_empty_on_commit: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            resize_handle_px: 8.0,
            stacking: StackingConfig::default(),
            frame_eligible_kinds: vec![OverlayKind::EntrySelected],
            labels: LabelConfig::default(),
        }
    }
}

impl Default for StackingConfig {
    fn default() -> Self {
        Self {
            top_pane: PaneId::Network,
        }
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            remove_empty_on_commit: true,
        }
    }
}

impl OverlayConfig {
    pub fn from_json(data: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.resize_handle_px.is_finite() || self.resize_handle_px < 0.0 {
            return Err(ConfigError::InvalidHandle(self.resize_handle_px));
        }
        Ok(())
    }
}
