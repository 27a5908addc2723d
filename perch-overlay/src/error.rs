//! Errors raised while coordinating overlays against a live document.

use perch_core::OverlayId;

use crate::host::ElementId;

pub type Result<T, E = OverlayError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OverlayError {
    #[error(transparent)]
    Core(#[from] perch_core::Error),

    /// The host could not measure an element, usually because it was removed.
    #[error("element `{0}` is not in the document")]
    Detached(ElementId),

    /// Repositioning was asked for an overlay opened without an anchor.
    #[error("overlay `{0}` is not anchored to a trigger")]
    NotAnchored(OverlayId),
}
