use timeline_overlays_protocol::OverlayKind;

/// Decides whether an overlay kind may be anchored to a given entry.
///
/// Only the frame/non-frame distinction is exposed, which is the one the
/// trace model cares about: synthetic frame records can host some overlay
/// kinds but not others.
pub trait OverlayEligibility {
    fn allows(&self, kind: OverlayKind, is_frame: bool) -> bool;
}

impl<F> OverlayEligibility for F
where
    F: Fn(OverlayKind, bool) -> bool,
{
    fn allows(&self, kind: OverlayKind, is_frame: bool) -> bool {
        self(kind, is_frame)
    }
}

/// Regular entries accept every kind; frames accept the listed kinds only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameKindsPolicy {
    kinds: Vec<OverlayKind>,
}

impl FrameKindsPolicy {
    pub fn new(kinds: Vec<OverlayKind>) -> Self {
        Self { kinds }
    }
}

impl OverlayEligibility for FrameKindsPolicy {
    fn allows(&self, kind: OverlayKind, is_frame: bool) -> bool {
        !is_frame || self.kinds.contains(&kind)
    }
}
