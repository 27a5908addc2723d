//! Per-frame coalescing of reposition requests.
//!
//! Scroll and resize fire far more often than the screen refreshes. Requests
//! made between two animation frames collapse into one recomputation per
//! overlay, done when the frame callback runs.

use perch_core::OverlayId;

#[derive(Debug, Default)]
pub struct FrameScheduler {
    queued: Vec<OverlayId>,
}

impl FrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `id` for the next frame. Returns `true` if this call scheduled a
    /// new frame (nothing else was queued yet).
    pub fn request(&mut self, id: &OverlayId) -> bool {
        let first = self.queued.is_empty();
        if !self.queued.contains(id) {
            self.queued.push(id.clone());
        }
        first
    }

    /// Drop a queued request, e.g. when the overlay closes before the frame.
    pub fn cancel(&mut self, id: &OverlayId) {
        self.queued.retain(|queued| queued != id);
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.queued.is_empty()
    }

    /// Take the overlays to recompute this frame, in request order.
    pub fn take_frame(&mut self) -> Vec<OverlayId> {
        std::mem::take(&mut self.queued)
    }
}
