pub mod commands;
pub mod kind;
pub mod theme;
pub mod types;

pub use commands::{NodeCommand, NodeContent, NodeLayout, SectionContent};
pub use kind::{OverlayKind, UnknownOverlayKind};
pub use theme::ThemeToken;
pub use types::{OverlayId, Rect};
