use serde::{Deserialize, Serialize};

use crate::kind::OverlayKind;
use crate::types::{OverlayId, Rect};

/// Everything a renderer needs to draw one overlay node.
///
/// The engine compares the previous and the new layout of every node and only
/// writes to the renderer when they differ, so this type must compare by value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    /// Bounding box in chart pixels (top of the topmost pane is y = 0).
    pub rect: Rect,
    /// False when the anchor is off screen or its level is collapsed. Hidden
    /// nodes keep existing so that they can be shown again without churn.
    pub visible: bool,
    pub content: NodeContent,
}

impl NodeLayout {
    pub fn hidden(content: NodeContent) -> Self {
        Self {
            rect: Rect::ZERO,
            visible: false,
            content,
        }
    }
}

/// Kind-specific payload of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeContent {
    /// Highlight box around a selected entry.
    Outline,
    /// Text label attached to an entry.
    Label { text: String, editing: bool },
    /// Shaded time span with an optional duration caption.
    Range {
        label: String,
        duration: Option<String>,
    },
    /// Consecutive labelled sections, e.g. the phases of an interaction.
    Breakdown { sections: Vec<SectionContent> },
    /// Vertical cursor line.
    Marker { timestamp: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionContent {
    pub rect: Rect,
    pub label: String,
    pub duration: Option<String>,
}

/// A single node mutation, as emitted by the command-recording backend.
///
/// A renderer replaying the stream in order ends up with exactly one node per
/// live overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum NodeCommand {
    Create {
        id: OverlayId,
        kind: OverlayKind,
        layout: NodeLayout,
    },
    Update {
        id: OverlayId,
        layout: NodeLayout,
    },
    Destroy {
        id: OverlayId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_json_shape() {
        let cmd = NodeCommand::Create {
            id: OverlayId::from_raw(1),
            kind: OverlayKind::EntryLabel,
            layout: NodeLayout {
                rect: Rect::new(1.0, 2.0, 3.0, 4.0),
                visible: true,
                content: NodeContent::Label {
                    text: "slow".into(),
                    editing: false,
                },
            },
        };
        let value = serde_json::to_value(&cmd).expect("serialize");
        assert_eq!(value["op"], "create");
        assert_eq!(value["id"], 1);
        assert_eq!(value["kind"], "ENTRY_LABEL");
        assert_eq!(value["layout"]["content"]["type"], "label");
        assert_eq!(value["layout"]["content"]["text"], "slow");
    }

    #[test]
    fn hidden_layout_has_empty_rect() {
        let layout = NodeLayout::hidden(NodeContent::Outline);
        assert!(!layout.visible);
        assert_eq!(layout.rect, Rect::ZERO);
    }
}
