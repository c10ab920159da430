use std::collections::BTreeSet;

use timeline_overlays_protocol::{NodeCommand, NodeLayout, OverlayId, OverlayKind};

/// Rendering technology behind the overlay nodes.
///
/// The registry guarantees that `create` is called once per overlay, `patch`
/// only with a layout that differs from the previous one, and `destroy`
/// exactly once when the overlay goes away.
pub trait OverlayBackend {
    /// Handle to whatever the backend allocated for one overlay.
    type Node;

    fn create(&mut self, id: OverlayId, kind: OverlayKind, layout: &NodeLayout) -> Self::Node;

    fn patch(&mut self, node: &mut Self::Node, layout: &NodeLayout);

    fn destroy(&mut self, node: Self::Node);
}

/// Backend that records every node mutation as a [`NodeCommand`].
///
/// Used by the WASM bridge, which ships the command stream to JavaScript, and
/// by tests that assert on exact DOM-like effects.
#[derive(Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<NodeCommand>,
    live: BTreeSet<OverlayId>,
}

impl CommandRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded since the last drain.
    pub fn drain(&mut self) -> Vec<NodeCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn commands(&self) -> &[NodeCommand] {
        &self.commands
    }

    /// Number of nodes currently alive.
    pub fn node_count(&self) -> usize {
        self.live.len()
    }

    pub fn has_node(&self, id: OverlayId) -> bool {
        self.live.contains(&id)
    }
}

impl OverlayBackend for CommandRecorder {
    type Node = OverlayId;

    fn create(&mut self, id: OverlayId, kind: OverlayKind, layout: &NodeLayout) -> OverlayId {
        self.live.insert(id);
        self.commands.push(NodeCommand::Create {
            id,
            kind,
            layout: layout.clone(),
        });
        id
    }

    fn patch(&mut self, node: &mut OverlayId, layout: &NodeLayout) {
        self.commands.push(NodeCommand::Update {
            id: *node,
            layout: layout.clone(),
        });
    }

    fn destroy(&mut self, node: OverlayId) {
        self.live.remove(&node);
        self.commands.push(NodeCommand::Destroy { id: node });
    }
}
