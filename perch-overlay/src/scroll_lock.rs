//! Reference-counted page scroll lock.
//!
//! Every open modal holds the lock. The page scrolls again only once the
//! last holder lets go, so nested modals do not unlock early.

use perch_core::OverlayId;

#[derive(Debug, Default)]
pub struct ScrollLock {
    holders: Vec<OverlayId>,
}

impl ScrollLock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when this acquisition locked a previously free page.
    pub fn acquire(&mut self, holder: &OverlayId) -> bool {
        if self.holders.contains(holder) {
            return false;
        }
        self.holders.push(holder.clone());
        let locked = self.holders.len() == 1;
        if locked {
            tracing::debug!(%holder, "page scroll locked");
        }
        locked
    }

    /// Returns `true` when this release unlocked the page. Unknown holders
    /// are ignored.
    pub fn release(&mut self, holder: &OverlayId) -> bool {
        let before = self.holders.len();
        self.holders.retain(|existing| existing != holder);
        let unlocked = before > 0 && before != self.holders.len() && self.holders.is_empty();
        if unlocked {
            tracing::debug!(%holder, "page scroll unlocked");
        }
        unlocked
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        !self.holders.is_empty()
    }
}
