//! Focus containment for modal overlays.
//!
//! Traps nest: only the most recently activated trap intercepts Tab. Each
//! trap remembers what had focus before it was activated, and hands that
//! element back when it is torn down, provided the element is still reachable:
//! either no trap remains or it lies inside the trap that is now on top.

use perch_core::OverlayId;

use crate::host::{DomHost, ElementId, ElementState};
use crate::input::{KeyCode, KeyEvent};

#[derive(Debug, Clone)]
struct FocusTrap {
    owner: OverlayId,
    container: ElementId,
    restore: Option<ElementId>,
}

#[derive(Debug, Default)]
pub struct FocusTrapStack {
    traps: Vec<FocusTrap>,
}

/// Focusable descendants of `container`, in tab order.
#[must_use]
pub fn focusable_elements(container: &ElementId, host: &impl DomHost) -> Vec<ElementId> {
    host.descendants(container)
        .into_iter()
        .filter(ElementState::is_focusable)
        .map(|element| element.id)
        .collect()
}

impl FocusTrapStack {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trap focus inside `container` for `owner`.
    ///
    /// Returns the element that should receive focus now: the first focusable
    /// descendant, or the container itself when there is none.
    pub fn activate(
        &mut self,
        owner: OverlayId,
        container: ElementId,
        host: &impl DomHost,
    ) -> ElementId {
        let restore = host.active_element();
        let initial = focusable_elements(&container, host)
            .into_iter()
            .next()
            .unwrap_or_else(|| container.clone());
        tracing::debug!(%owner, %container, ?restore, "focus trap activated");
        self.traps.retain(|trap| trap.owner != owner);
        self.traps.push(FocusTrap {
            owner,
            container,
            restore,
        });
        initial
    }

    /// Tear down the trap of `owner`.
    ///
    /// Returns the element to give focus back to, when the trap recorded one
    /// and the remaining top trap (if any) contains it.
    pub fn deactivate(&mut self, owner: &OverlayId, host: &impl DomHost) -> Option<ElementId> {
        let position = self.traps.iter().position(|trap| &trap.owner == owner)?;
        let trap = self.traps.remove(position);
        tracing::debug!(owner = %trap.owner, remaining = self.traps.len(), "focus trap released");
        let restore = trap.restore?;
        match self.traps.last() {
            None => Some(restore),
            Some(top) if host.contains(&top.container, &restore) => Some(restore),
            Some(top) => {
                tracing::debug!(%restore, container = %top.container, "restore target outside the active trap");
                None
            }
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.traps.is_empty()
    }

    #[must_use]
    pub fn active_owner(&self) -> Option<&OverlayId> {
        self.traps.last().map(|trap| &trap.owner)
    }

    /// Where focus must go for a Tab press, or `None` to let it proceed.
    ///
    /// Focus wraps at the ends of the focusable set, and is pulled back to
    /// the first (or last, with Shift) element when it has left the trap.
    pub fn handle_tab(&self, shift: bool, host: &impl DomHost) -> Option<ElementId> {
        let trap = self.traps.last()?;
        let focusable = focusable_elements(&trap.container, host);
        let (Some(first), Some(last)) = (focusable.first(), focusable.last()) else {
            return Some(trap.container.clone());
        };

        let active = host.active_element();
        let position = active
            .as_ref()
            .and_then(|active| focusable.iter().position(|id| id == active));

        match position {
            None if shift => Some(last.clone()),
            None => Some(first.clone()),
            Some(0) if shift => Some(last.clone()),
            Some(i) if !shift && i + 1 == focusable.len() => Some(first.clone()),
            Some(_) => None,
        }
    }

    /// Convenience wrapper over [`Self::handle_tab`] for a key event.
    pub fn handle_key(&self, key: &KeyEvent, host: &impl DomHost) -> Option<ElementId> {
        match key.code {
            KeyCode::Tab => self.handle_tab(key.is_shift(), host),
            _ => None,
        }
    }
}
