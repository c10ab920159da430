//! Coordinate and lifecycle engine for annotation overlays drawn on top of a
//! two-pane trace timeline.
//!
//! Callers feed pane sizes and the visible time window into an [`Overlays`]
//! registry, add overlays, and call [`Overlays::update`] to bring the visual
//! nodes of an [`OverlayBackend`] in line.

pub mod backend;
pub mod config;
pub mod coords;
pub mod eligibility;
pub mod error;
pub mod events;
pub mod format;
pub mod geometry;
mod layout;
pub mod overlay;
pub mod provider;
pub mod registry;
pub mod scenario;
pub mod window;

pub use backend::{CommandRecorder, OverlayBackend};
pub use config::{ConfigError, OverlayConfig};
pub use eligibility::{FrameKindsPolicy, OverlayEligibility};
pub use error::OverlayError;
pub use events::{AnnotationEvents, AnnotationModified, AnnotationOverlayAction};
pub use geometry::{ChartGeometry, PaneDimensions, PaneId};
pub use overlay::{BreakdownSection, Overlay, OverlayPatch};
pub use provider::EntryGeometryProvider;
pub use registry::{LabelCommit, Overlays, ReconcileStats};
pub use scenario::{EntryRecord, Scenario, ScenarioError, TableProvider, parse_scenario};
pub use window::TimeWindow;
