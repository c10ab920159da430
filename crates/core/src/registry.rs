use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use timeline_overlays_protocol::{NodeLayout, OverlayId, OverlayKind};

use crate::backend::OverlayBackend;
use crate::config::OverlayConfig;
use crate::coords::CoordinateResolver;
use crate::eligibility::{FrameKindsPolicy, OverlayEligibility};
use crate::error::OverlayError;
use crate::events::{AnnotationEvents, AnnotationModified, AnnotationOverlayAction};
use crate::geometry::{ChartGeometry, PaneDimensions, PaneId};
use crate::layout::layout_overlay;
use crate::overlay::{Overlay, OverlayPatch};
use crate::provider::EntryGeometryProvider;
use crate::window::TimeWindow;

type LabelCommitHook = Box<dyn Fn(&str) -> bool>;

/// What happened to an entry label when editing ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelCommit {
    Kept,
    Removed,
}

/// Node operations performed by one [`Overlays::update`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileStats {
    pub created: usize,
    pub patched: usize,
    pub unchanged: usize,
    pub destroyed: usize,
}

struct Rendered<N> {
    node: N,
    layout: NodeLayout,
}

/// Authoritative set of overlays and their rendered nodes.
///
/// Mutations (`add`, `update_existing`, geometry and window changes) only
/// touch in-memory state; nodes catch up on the next [`Self::update`]. Removal
/// is the exception: it destroys the node immediately so no node ever
/// outlives its overlay.
pub struct Overlays<P, B>
where
    P: EntryGeometryProvider,
    B: OverlayBackend,
{
    provider: P,
    backend: B,
    geometry: ChartGeometry,
    window: Option<TimeWindow>,
    /// Insertion order is paint order.
    overlays: Vec<(OverlayId, Overlay<P::Entry>)>,
    rendered: BTreeMap<OverlayId, Rendered<B::Node>>,
    editing: HashSet<OverlayId>,
    next_id: u64,
    eligibility: Box<dyn OverlayEligibility>,
    label_commit: LabelCommitHook,
    events: AnnotationEvents<P::Entry>,
}

impl<P, B> Overlays<P, B>
where
    P: EntryGeometryProvider,
    B: OverlayBackend,
{
    pub fn new(provider: P, backend: B, config: OverlayConfig) -> Self {
        let label_commit: LabelCommitHook = if config.labels.remove_empty_on_commit {
            Box::new(|text: &str| !text.trim().is_empty())
        } else {
            Box::new(|_: &str| true)
        };
        Self {
            provider,
            backend,
            geometry: ChartGeometry::new(config.stacking.top_pane, config.resize_handle_px),
            window: None,
            overlays: Vec::new(),
            rendered: BTreeMap::new(),
            editing: HashSet::new(),
            next_id: 1,
            eligibility: Box::new(FrameKindsPolicy::new(config.frame_eligible_kinds)),
            label_commit,
            events: AnnotationEvents::default(),
        }
    }

    // --- Collaborators ---

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// The trace model may change under the overlays (e.g. a group expands);
    /// call [`Self::update`] afterwards.
    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn events(&mut self) -> &mut AnnotationEvents<P::Entry> {
        &mut self.events
    }

    pub fn set_eligibility(&mut self, policy: impl OverlayEligibility + 'static) {
        self.eligibility = Box::new(policy);
    }

    /// Replace the hook deciding whether a committed label survives. It gets
    /// the label text and returns `true` to keep the overlay.
    pub fn set_label_commit_hook(&mut self, hook: impl Fn(&str) -> bool + 'static) {
        self.label_commit = Box::new(hook);
    }

    // --- Geometry ---

    pub fn update_chart_dimensions(
        &mut self,
        pane: PaneId,
        dims: PaneDimensions,
    ) -> Result<(), OverlayError> {
        self.geometry.update(pane, dims)
    }

    pub fn update_visible_window(&mut self, window: TimeWindow) {
        self.window = Some(window);
    }

    pub fn visible_window(&self) -> Option<&TimeWindow> {
        self.window.as_ref()
    }

    pub fn geometry(&self) -> &ChartGeometry {
        &self.geometry
    }

    fn resolver(&self) -> CoordinateResolver<'_, P> {
        CoordinateResolver {
            provider: &self.provider,
            geometry: &self.geometry,
            window: self.window.as_ref(),
        }
    }

    /// Left edge of `entry` in chart pixels. Not clipped to the pane.
    pub fn x_pixel_for_event_on_chart(&self, entry: &P::Entry) -> Result<f64, OverlayError> {
        self.resolver().x_pixel_for_entry(entry)
    }

    /// Top edge of `entry` in whole-chart pixels, `None` if its level is hidden.
    pub fn y_pixel_for_event_on_chart(
        &self,
        entry: &P::Entry,
    ) -> Result<Option<f64>, OverlayError> {
        self.resolver().y_pixel_for_entry(entry)
    }

    // --- Lifecycle ---

    /// Register an overlay. It is drawn on the next [`Self::update`].
    pub fn add(&mut self, overlay: Overlay<P::Entry>) -> Result<OverlayId, OverlayError> {
        let kind = overlay.kind();
        overlay.validate()?;
        if let Some(entry) = overlay.entry() {
            self.check_eligible(kind, entry)?;
        }
        let id = OverlayId::from_raw(self.next_id);
        self.next_id += 1;
        if let Overlay::EntryLabel { label, .. } = &overlay
            && label.is_empty()
        {
            self.editing.insert(id);
        }
        log::debug!("add {id} ({kind})");
        self.overlays.push((id, overlay));
        Ok(id)
    }

    fn check_eligible(&self, kind: OverlayKind, entry: &P::Entry) -> Result<(), OverlayError> {
        let is_frame = self.provider.is_frame_entry(entry);
        if self.eligibility.allows(kind, is_frame) {
            Ok(())
        } else {
            Err(OverlayError::IneligibleEntry { kind })
        }
    }

    fn position(&self, id: OverlayId) -> Result<usize, OverlayError> {
        self.overlays
            .iter()
            .position(|(candidate, _)| *candidate == id)
            .ok_or(OverlayError::UnknownOverlay(id))
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay<P::Entry>> {
        self.overlays
            .iter()
            .find(|(candidate, _)| *candidate == id)
            .map(|(_, overlay)| overlay)
    }

    /// Overlays in paint order.
    pub fn iter(&self) -> impl Iterator<Item = (OverlayId, &Overlay<P::Entry>)> {
        self.overlays.iter().map(|(id, overlay)| (*id, overlay))
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    /// Merge `patch` into the stored overlay. Fields that do not exist on the
    /// overlay's kind are rejected before anything changes.
    pub fn update_existing(
        &mut self,
        id: OverlayId,
        patch: OverlayPatch<P::Entry>,
    ) -> Result<(), OverlayError> {
        let index = self.position(id)?;
        let kind = self.overlays[index].1.kind();
        patch.check_applies_to(kind)?;
        if let Some(entry) = &patch.entry {
            self.check_eligible(kind, entry)?;
        }
        patch.apply(&mut self.overlays[index].1);
        Ok(())
    }

    /// Drop an overlay and destroy its node right away.
    pub fn remove(&mut self, id: OverlayId) -> Result<Overlay<P::Entry>, OverlayError> {
        let index = self.position(id)?;
        let (_, overlay) = self.overlays.remove(index);
        self.teardown(id);
        log::debug!("remove {id} ({})", overlay.kind());
        Ok(overlay)
    }

    /// Remove every overlay of `kind`. Returns how many were removed.
    pub fn remove_overlays_of_type(&mut self, kind: OverlayKind) -> usize {
        let doomed: Vec<OverlayId> = self
            .overlays
            .iter()
            .filter(|(_, overlay)| overlay.kind() == kind)
            .map(|(id, _)| *id)
            .collect();
        self.overlays.retain(|(_, overlay)| overlay.kind() != kind);
        for id in &doomed {
            self.teardown(*id);
        }
        if !doomed.is_empty() {
            log::debug!("removed {} {kind} overlays", doomed.len());
        }
        doomed.len()
    }

    fn teardown(&mut self, id: OverlayId) {
        self.editing.remove(&id);
        if let Some(rendered) = self.rendered.remove(&id) {
            self.backend.destroy(rendered.node);
        }
    }

    /// Every overlay anchored to `entry`.
    pub fn overlays_for_entry(&self, entry: &P::Entry) -> Vec<(OverlayId, &Overlay<P::Entry>)> {
        self.iter()
            .filter(|(_, overlay)| overlay.entry() == Some(entry))
            .collect()
    }

    /// Layout last pushed to the backend for `id`.
    pub fn node_layout(&self, id: OverlayId) -> Option<&NodeLayout> {
        self.rendered.get(&id).map(|r| &r.layout)
    }

    /// Bring the nodes in line with the overlays.
    ///
    /// Every layout is computed before the backend is touched, so a failure
    /// (no window yet, unknown pane size) leaves the nodes as they were.
    /// Nodes whose layout did not change get no backend call.
    pub fn update(&mut self) -> Result<ReconcileStats, OverlayError> {
        let layouts = {
            let resolver = self.resolver();
            self.overlays
                .iter()
                .map(|(id, overlay)| {
                    layout_overlay(&resolver, overlay, self.editing.contains(id))
                        .map(|layout| (*id, overlay.kind(), layout))
                })
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut stats = ReconcileStats::default();

        let stale: Vec<OverlayId> = self
            .rendered
            .keys()
            .filter(|id| !layouts.iter().any(|(live, _, _)| live == *id))
            .copied()
            .collect();
        for id in stale {
            self.teardown(id);
            stats.destroyed += 1;
        }

        for (id, kind, layout) in layouts {
            match self.rendered.get_mut(&id) {
                Some(rendered) if rendered.layout == layout => stats.unchanged += 1,
                Some(rendered) => {
                    self.backend.patch(&mut rendered.node, &layout);
                    rendered.layout = layout;
                    stats.patched += 1;
                }
                None => {
                    let node = self.backend.create(id, kind, &layout);
                    self.rendered.insert(id, Rendered { node, layout });
                    stats.created += 1;
                }
            }
        }

        log::debug!(
            "reconciled {} overlays: {} created, {} patched, {} unchanged, {} destroyed",
            self.overlays.len(),
            stats.created,
            stats.patched,
            stats.unchanged,
            stats.destroyed
        );
        Ok(stats)
    }

    // --- Entry label interaction ---

    fn label_mut(&mut self, id: OverlayId) -> Result<&mut String, OverlayError> {
        let index = self.position(id)?;
        match &mut self.overlays[index].1 {
            Overlay::EntryLabel { label, .. } => Ok(label),
            other => Err(OverlayError::PatchMismatch {
                kind: other.kind(),
                field: "label",
            }),
        }
    }

    /// Put an entry label into editing state (e.g. on double click).
    pub fn begin_label_edit(&mut self, id: OverlayId) -> Result<(), OverlayError> {
        self.label_mut(id)?;
        self.editing.insert(id);
        Ok(())
    }

    pub fn is_editing(&self, id: OverlayId) -> bool {
        self.editing.contains(&id)
    }

    /// Replace the text of an entry label while the user types.
    pub fn set_label_text(
        &mut self,
        id: OverlayId,
        text: impl Into<String>,
    ) -> Result<(), OverlayError> {
        let text = text.into();
        let label = self.label_mut(id)?;
        label.clone_from(&text);
        self.events
            .emit(AnnotationOverlayAction::LabelChanged { id, label: text });
        Ok(())
    }

    /// End editing (e.g. on blur or Enter) and let the commit hook decide
    /// whether the label stays. A dropped label is removed at once and
    /// reported through [`Self::events`].
    pub fn commit_label(&mut self, id: OverlayId) -> Result<LabelCommit, OverlayError> {
        let keep = {
            let label = self.label_mut(id)?;
            let text = label.as_str().to_owned();
            (self.label_commit)(&text)
        };
        self.editing.remove(&id);
        if keep {
            return Ok(LabelCommit::Kept);
        }
        let overlay = self.remove(id)?;
        self.events
            .emit(AnnotationOverlayAction::Removed { id, overlay });
        Ok(LabelCommit::Removed)
    }

    // --- Annotations manager bridge ---

    /// Apply a notification from the annotations manager. Returns the id of
    /// the overlay created for an `Added` annotation.
    pub fn handle_annotation_event(
        &mut self,
        event: AnnotationModified<P::Entry>,
    ) -> Result<Option<OverlayId>, OverlayError> {
        match event {
            AnnotationModified::Added(overlay) => self.add(overlay).map(Some),
            AnnotationModified::Removed(id) => self.remove(id).map(|_| None),
        }
    }
}
