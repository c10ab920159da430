//! Annotation traffic between the overlay registry and an external
//! annotations manager.
//!
//! Inbound: the manager tells the registry an annotation was created or
//! deleted ([`AnnotationModified`]). Outbound: the registry tells the manager
//! the user changed or dropped an annotation overlay
//! ([`AnnotationOverlayAction`]). Neither side holds a reference to the other.

use serde::Serialize;
use timeline_overlays_protocol::OverlayId;

use crate::overlay::Overlay;

/// Annotation lifecycle notification coming from the annotations manager.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationModified<E> {
    Added(Overlay<E>),
    Removed(OverlayId),
}

/// Something the user did to an annotation overlay.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AnnotationOverlayAction<E> {
    /// The overlay was dropped (e.g. a label committed with no text). It is
    /// already gone from the registry; the payload is the final value.
    Removed { id: OverlayId, overlay: Overlay<E> },
    /// The label text of an entry label changed.
    LabelChanged { id: OverlayId, label: String },
}

type Subscriber<E> = Box<dyn FnMut(&AnnotationOverlayAction<E>)>;

/// Outbound channel for [`AnnotationOverlayAction`]s.
///
/// `emit` calls every subscriber immediately, in subscription order, and
/// also queues the event for callers that prefer to poll with [`Self::drain`].
pub struct AnnotationEvents<E> {
    subscribers: Vec<Subscriber<E>>,
    queue: Vec<AnnotationOverlayAction<E>>,
}

impl<E> Default for AnnotationEvents<E> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            queue: Vec::new(),
        }
    }
}

impl<E> std::fmt::Debug for AnnotationEvents<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationEvents")
            .field("subscribers", &self.subscribers.len())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl<E> AnnotationEvents<E> {
    pub fn subscribe(&mut self, callback: impl FnMut(&AnnotationOverlayAction<E>) + 'static) {
        self.subscribers.push(Box::new(callback));
    }

    pub(crate) fn emit(&mut self, event: AnnotationOverlayAction<E>) {
        for subscriber in &mut self.subscribers {
            subscriber(&event);
        }
        self.queue.push(event);
    }

    /// Events emitted since the last drain, oldest first.
    pub fn drain(&mut self) -> Vec<AnnotationOverlayAction<E>> {
        std::mem::take(&mut self.queue)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn subscribers_and_queue_both_see_events() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut events: AnnotationEvents<u64> = AnnotationEvents::default();
        let sink = Rc::clone(&seen);
        events.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let action = AnnotationOverlayAction::LabelChanged {
            id: OverlayId::from_raw(3),
            label: "hot path".into(),
        };
        events.emit(action.clone());

        assert_eq!(*seen.borrow(), vec![action.clone()]);
        assert_eq!(events.pending(), 1);
        assert_eq!(events.drain(), vec![action]);
        assert_eq!(events.pending(), 0);
    }
}
