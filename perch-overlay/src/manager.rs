//! The application-level overlay state.
//!
//! `OverlayManager` is constructed once per application instance and passed
//! to whatever handles DOM events. It owns every registry that would
//! otherwise be a global: the lifecycle coordinator (and through it the
//! z-index allocator), the click-outside registry, the navigation context,
//! the focus trap stack, the frame scheduler and the scroll lock.
//!
//! Each operation runs to completion, then forwards the notifications it
//! produced to subscribers in order.

use std::collections::HashMap;

use perch_core::{
    auto_position, compute_placement, CloseReason, LayerType, OverlayCoordinator, OverlayId,
    OverlayRecord, Placement, PositionOptions, PositionResult,
};

use crate::click_outside::ClickOutside;
use crate::config::PerchConfig;
use crate::error::{OverlayError, Result};
use crate::events::{EventBus, SubscriptionId};
use crate::focus_trap::FocusTrapStack;
use crate::host::{DomHost, ElementId};
use crate::input::{KeyCode, KeyEvent};
use crate::navigation::{NavOutcome, NavigationController, NavigationOptions};
use crate::scheduler::FrameScheduler;
use crate::scroll_lock::ScrollLock;

/// How an anchored overlay picks its side.
#[derive(Debug, Clone, PartialEq)]
pub enum PlacementStrategy {
    /// One preferred placement, flipped when it overflows.
    Preferred(Placement),
    /// The most visible of several candidates. `None` uses the configured
    /// preferred placements.
    Auto(Option<Vec<Placement>>),
}

/// Ties floating content to the trigger it is positioned against.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub trigger: ElementId,
    pub content: ElementId,
    pub strategy: PlacementStrategy,
}

/// Everything needed to open an overlay.
#[derive(Debug, Clone)]
pub struct OpenRequest {
    pub id: OverlayId,
    pub layer_type: LayerType,
    pub priority: i32,
    pub anchor: Option<Anchor>,
    /// Element watched for click-outside, and selectors that do not count as
    /// outside.
    pub dismiss: Option<(ElementId, Vec<String>)>,
    /// Container to trap focus in once opened.
    pub focus_trap: Option<ElementId>,
    /// Container whose items are keyboard-navigable once opened.
    pub navigation: Option<ElementId>,
}

impl OpenRequest {
    #[must_use]
    pub fn new(id: impl Into<OverlayId>, layer_type: LayerType) -> Self {
        Self {
            id: id.into(),
            layer_type,
            priority: 0,
            anchor: None,
            dismiss: None,
            focus_trap: None,
            navigation: None,
        }
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn anchored(
        mut self,
        trigger: impl Into<ElementId>,
        content: impl Into<ElementId>,
        strategy: PlacementStrategy,
    ) -> Self {
        self.anchor = Some(Anchor {
            trigger: trigger.into(),
            content: content.into(),
            strategy,
        });
        self
    }

    #[must_use]
    pub fn dismiss_on_click_outside(
        mut self,
        element: impl Into<ElementId>,
        exclude: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.dismiss = Some((element.into(), exclude.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn trap_focus(mut self, container: impl Into<ElementId>) -> Self {
        self.focus_trap = Some(container.into());
        self
    }

    #[must_use]
    pub fn navigable(mut self, container: impl Into<ElementId>) -> Self {
        self.navigation = Some(container.into());
        self
    }
}

/// What a key press did.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    Ignored,
    /// Focus must move here; the default Tab action should be prevented.
    FocusMoved(ElementId),
    Navigation(NavOutcome),
    /// A close was requested for this overlay.
    Dismissed(OverlayId),
}

#[derive(Debug, Clone, Default)]
struct Behaviors {
    anchor: Option<Anchor>,
    focus_trap: Option<ElementId>,
    navigation: Option<ElementId>,
}

#[derive(Debug)]
pub struct OverlayManager {
    options: PositionOptions,
    navigation_options: NavigationOptions,
    coordinator: OverlayCoordinator,
    behaviors: HashMap<OverlayId, Behaviors>,
    placements: HashMap<OverlayId, PositionResult>,
    click_outside: ClickOutside,
    navigation: NavigationController,
    focus_traps: FocusTrapStack,
    scheduler: FrameScheduler,
    scroll_lock: ScrollLock,
    bus: EventBus,
}

impl Default for OverlayManager {
    fn default() -> Self {
        Self::new(&PerchConfig::default())
    }
}

impl OverlayManager {
    #[must_use]
    pub fn new(config: &PerchConfig) -> Self {
        Self {
            options: config.positioning.clone(),
            navigation_options: config.navigation.clone(),
            coordinator: OverlayCoordinator::new(config.layers),
            behaviors: HashMap::new(),
            placements: HashMap::new(),
            click_outside: ClickOutside::new(),
            navigation: NavigationController::new(),
            focus_traps: FocusTrapStack::new(),
            scheduler: FrameScheduler::new(),
            scroll_lock: ScrollLock::new(),
            bus: EventBus::new(),
        }
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&perch_core::OverlayEvent) + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Forward queued coordinator notifications to subscribers.
    fn dispatch(&mut self) {
        for event in self.coordinator.drain_events() {
            self.bus.emit(&event);
        }
    }

    /// Open an overlay.
    ///
    /// Anchored overlays are measured and placed before anything is recorded,
    /// so a detached trigger or degenerate geometry leaves no trace. Opening
    /// an overlay that is already open returns its record unchanged; opening
    /// one that is still closing fails.
    pub fn open(&mut self, request: OpenRequest, host: &impl DomHost) -> Result<OverlayRecord> {
        if self.coordinator.record(&request.id).is_some() {
            let record =
                self.coordinator
                    .request_open(request.id, request.layer_type, request.priority)?;
            return Ok(record);
        }

        let placement = request
            .anchor
            .as_ref()
            .map(|anchor| self.place(anchor, host))
            .transpose()?;

        let record =
            self.coordinator
                .request_open(request.id.clone(), request.layer_type, request.priority)?;
        let id = record.id.clone();
        tracing::debug!(%id, layer = %record.layer_type, z_index = record.z_index, "opening overlay");

        if let Some(result) = placement {
            self.placements.insert(id.clone(), result);
            self.coordinator.notify_placement(&id, result)?;
        }
        if let Some((element, exclude)) = request.dismiss {
            self.click_outside.register(id.clone(), element, exclude);
        }
        if record.layer_type == LayerType::Modal {
            self.scroll_lock.acquire(&id);
        }
        self.behaviors.insert(
            id,
            Behaviors {
                anchor: request.anchor,
                focus_trap: request.focus_trap,
                navigation: request.navigation,
            },
        );

        self.dispatch();
        Ok(record)
    }

    /// Mark the overlay as visible and start its focus trap and navigation.
    ///
    /// Returns the element that should receive focus, if the overlay traps it.
    pub fn confirm_opened(
        &mut self,
        id: &OverlayId,
        host: &impl DomHost,
    ) -> Result<Option<ElementId>> {
        self.coordinator.confirm_opened(id)?;
        let behaviors = self.behaviors.get(id).cloned().unwrap_or_default();

        let focus = behaviors
            .focus_trap
            .map(|container| self.focus_traps.activate(id.clone(), container, host));
        if let Some(container) = behaviors.navigation {
            self.navigation
                .activate(id.clone(), container, self.navigation_options.clone());
        }

        self.dispatch();
        Ok(focus)
    }

    /// Ask the overlay's owner to close it.
    pub fn close(&mut self, id: &OverlayId, reason: CloseReason) -> Result<()> {
        self.coordinator.request_close(id, reason)?;
        self.dispatch();
        Ok(())
    }

    /// The overlay started its exit transition; it stops reacting to input.
    pub fn confirm_closing(&mut self, id: &OverlayId) -> Result<()> {
        self.coordinator.confirm_closing(id)?;
        self.click_outside.unregister(id);
        self.navigation.deactivate(id);
        self.scheduler.cancel(id);
        self.dispatch();
        Ok(())
    }

    /// The overlay is gone. Releases everything it held.
    ///
    /// Returns the element focus should go back to, when this overlay owned a
    /// focus trap and that element is still reachable from the traps left.
    pub fn confirm_closed(
        &mut self,
        id: &OverlayId,
        host: &impl DomHost,
    ) -> Result<Option<ElementId>> {
        let record = self.coordinator.confirm_closed(id)?;
        self.click_outside.unregister(id);
        self.navigation.deactivate(id);
        self.scheduler.cancel(id);
        self.placements.remove(id);
        self.behaviors.remove(id);
        if record.layer_type == LayerType::Modal {
            self.scroll_lock.release(id);
        }
        let restore = self.focus_traps.deactivate(id, host);
        tracing::debug!(%id, ?restore, "overlay closed");

        self.dispatch();
        Ok(restore)
    }

    fn place(&self, anchor: &Anchor, host: &impl DomHost) -> Result<PositionResult> {
        let measure = |element: &ElementId| {
            host.bounding_rect(element)
                .ok_or_else(|| OverlayError::Detached(element.clone()))
        };
        let trigger = measure(&anchor.trigger)?;
        let content = measure(&anchor.content)?;
        let viewport = host.viewport();

        let result = match &anchor.strategy {
            PlacementStrategy::Preferred(placement) => {
                compute_placement(&trigger, &content, *placement, &self.options, &viewport)?
            }
            PlacementStrategy::Auto(candidates) => {
                let candidates = candidates
                    .as_deref()
                    .unwrap_or(&self.options.preferred_placements);
                auto_position(&trigger, &content, candidates, &self.options, &viewport)?
            }
        };
        Ok(result)
    }

    /// Recompute the placement of `id` from live geometry right away.
    pub fn reposition(&mut self, id: &OverlayId, host: &impl DomHost) -> Result<PositionResult> {
        let anchor = self
            .behaviors
            .get(id)
            .and_then(|behaviors| behaviors.anchor.as_ref())
            .ok_or_else(|| OverlayError::NotAnchored(id.clone()))?;
        let result = self.place(anchor, host)?;

        self.placements.insert(id.clone(), result);
        self.coordinator.notify_placement(id, result)?;
        self.dispatch();
        Ok(result)
    }

    /// Queue `id` for the next animation frame.
    ///
    /// Returns `true` when the caller needs to request a frame.
    pub fn schedule_reposition(&mut self, id: &OverlayId) -> bool {
        self.scheduler.request(id)
    }

    /// Queue every open anchored overlay, for scroll and resize handlers.
    pub fn viewport_changed(&mut self) -> bool {
        let mut ids: Vec<&OverlayId> = self
            .behaviors
            .iter()
            .filter(|(id, behaviors)| behaviors.anchor.is_some() && self.coordinator.is_open(id))
            .map(|(id, _)| id)
            .collect();
        ids.sort();
        let mut needs_frame = false;
        for id in ids {
            needs_frame |= self.scheduler.request(id);
        }
        needs_frame
    }

    /// Animation-frame callback: recompute each queued overlay once.
    ///
    /// Overlays that closed or lost their elements since being queued are
    /// skipped. Returns the overlays that were repositioned.
    pub fn on_animation_frame(&mut self, host: &impl DomHost) -> Vec<OverlayId> {
        let mut repositioned = Vec::new();
        for id in self.scheduler.take_frame() {
            if !self.coordinator.is_open(&id) {
                continue;
            }
            match self.reposition(&id, host) {
                Ok(_) => repositioned.push(id),
                Err(err) => tracing::warn!(%id, %err, "skipping reposition"),
            }
        }
        repositioned
    }

    /// Document-level pointer-down. Returns the overlays asked to close.
    pub fn pointer_down(&mut self, target: &ElementId, host: &impl DomHost) -> Vec<OverlayId> {
        let mut dismissed = Vec::new();
        for id in self.click_outside.pointer_down(target, host) {
            let already_closing = self
                .coordinator
                .record(&id)
                .is_none_or(|record| !record.is_open() || record.close_requested);
            if already_closing {
                continue;
            }
            if self.coordinator.request_close(&id, CloseReason::ClickOutside).is_ok() {
                dismissed.push(id);
            }
        }
        self.dispatch();
        dismissed
    }

    /// Document-level key-down.
    ///
    /// Tab goes to the active focus trap, other keys to the navigation
    /// context. An unhandled Escape dismisses the topmost overlay.
    pub fn key_down(&mut self, key: &KeyEvent, host: &impl DomHost) -> KeyOutcome {
        if key.code == KeyCode::Tab {
            return self
                .focus_traps
                .handle_key(key, host)
                .map_or(KeyOutcome::Ignored, KeyOutcome::FocusMoved);
        }

        match self.navigation.handle_key(key, host) {
            NavOutcome::Ignored => {}
            NavOutcome::Cancelled => {
                if let Some(owner) = self.navigation.owner().cloned() {
                    return self.dismiss(owner, CloseReason::Escape);
                }
            }
            outcome => return KeyOutcome::Navigation(outcome),
        }

        if key.code == KeyCode::Esc {
            if let Some(top) = self.coordinator.topmost().map(|record| record.id.clone()) {
                return self.dismiss(top, CloseReason::Escape);
            }
        }
        KeyOutcome::Ignored
    }

    fn dismiss(&mut self, id: OverlayId, reason: CloseReason) -> KeyOutcome {
        match self.close(&id, reason) {
            Ok(()) => KeyOutcome::Dismissed(id),
            Err(err) => {
                tracing::warn!(%id, %err, "could not dismiss overlay");
                KeyOutcome::Ignored
            }
        }
    }

    #[must_use]
    pub fn is_open(&self, id: &OverlayId) -> bool {
        self.coordinator.is_open(id)
    }

    #[must_use]
    pub fn list_open(&self, layer_type: Option<LayerType>) -> Vec<&OverlayRecord> {
        self.coordinator.list_open(layer_type)
    }

    #[must_use]
    pub fn record(&self, id: &OverlayId) -> Option<&OverlayRecord> {
        self.coordinator.record(id)
    }

    /// Last placement computed for `id`.
    #[must_use]
    pub fn placement(&self, id: &OverlayId) -> Option<PositionResult> {
        self.placements.get(id).copied()
    }

    #[must_use]
    pub fn scroll_locked(&self) -> bool {
        self.scroll_lock.is_locked()
    }

    #[must_use]
    pub fn frame_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    #[must_use]
    pub fn click_outside_listening(&self) -> bool {
        self.click_outside.listener_attached()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use perch_core::{OverlayEvent, Rect};

    use super::*;
    use crate::test_helpers::{record_events, FakeDom};

    fn page() -> FakeDom {
        let mut dom = FakeDom::new(1024.0, 768.0);
        dom.element("button", None)
            .rect("button", Rect::new(100.0, 100.0, 120.0, 32.0));
        dom.element("menu", None)
            .rect("menu", Rect::new(0.0, 0.0, 200.0, 150.0));
        dom
    }

    fn menu_request() -> OpenRequest {
        OpenRequest::new("menu", LayerType::Portal).anchored(
            "button",
            "menu",
            PlacementStrategy::Preferred(Placement::BottomStart),
        )
    }

    #[test]
    fn open_places_before_announcing() {
        let dom = page();
        let mut manager = OverlayManager::default();
        let events = record_events(&mut manager);

        let record = manager.open(menu_request(), &dom).expect("should open");
        assert_eq!(record.z_index, 1010);

        let expected = PositionResult {
            x: 100.0,
            y: 140.0,
            placement: Placement::BottomStart,
        };
        assert_eq!(manager.placement(&record.id), Some(expected));
        let events = events.borrow();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], OverlayEvent::OpenRequested { z_index: 1010, .. }));
        assert_eq!(
            events[1],
            OverlayEvent::PlacementComputed {
                id: record.id.clone(),
                result: expected,
            }
        );
    }

    #[test]
    fn detached_trigger_leaves_no_trace() {
        let mut dom = page();
        dom.remove("button");
        let mut manager = OverlayManager::default();
        let events = record_events(&mut manager);

        let err = manager.open(menu_request(), &dom).expect_err("should fail");
        assert_eq!(err, OverlayError::Detached(ElementId::from("button")));
        assert!(!manager.is_open(&OverlayId::from("menu")));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn degenerate_content_is_a_core_error() {
        let mut dom = page();
        dom.rect("menu", Rect::new(0.0, 0.0, 0.0, 150.0));
        let mut manager = OverlayManager::default();
        let err = manager.open(menu_request(), &dom).expect_err("should fail");
        assert!(matches!(
            err,
            OverlayError::Core(perch_core::Error::InvalidGeometry { what: "content", .. })
        ));
    }

    #[test]
    fn reopening_an_open_overlay_is_idempotent() {
        let dom = page();
        let mut manager = OverlayManager::default();
        let first = manager.open(menu_request(), &dom).expect("first open");
        let events = record_events(&mut manager);
        let second = manager.open(menu_request(), &dom).expect("second open");
        assert_eq!(first, second);
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn reopening_while_closing_fails() {
        let dom = page();
        let mut manager = OverlayManager::default();
        let id = manager.open(menu_request(), &dom).expect("open").id;
        manager.close(&id, CloseReason::Explicit).expect("close");
        manager.confirm_closing(&id).expect("closing");
        let err = manager.open(menu_request(), &dom).expect_err("still closing");
        assert!(matches!(
            err,
            OverlayError::Core(perch_core::Error::StateViolation { .. })
        ));
    }

    #[test]
    fn unanchored_overlays_cannot_be_repositioned() {
        let dom = page();
        let mut manager = OverlayManager::default();
        let id = manager
            .open(OpenRequest::new("toast", LayerType::Portal), &dom)
            .expect("open")
            .id;
        assert_eq!(
            manager.reposition(&id, &dom),
            Err(OverlayError::NotAnchored(id.clone()))
        );
    }

    #[test]
    fn auto_strategy_defaults_to_configured_candidates() {
        let mut dom = page();
        // Too close to the bottom edge for any bottom placement.
        dom.rect("button", Rect::new(100.0, 700.0, 120.0, 32.0));
        let mut manager = OverlayManager::default();
        let request = OpenRequest::new("menu", LayerType::Portal).anchored(
            "button",
            "menu",
            PlacementStrategy::Auto(None),
        );
        let id = manager.open(request, &dom).expect("open").id;
        let placement = manager.placement(&id).expect("placed");
        assert_eq!(placement.placement, Placement::TopStart);
        assert_eq!(placement.y, 700.0 - 150.0 - 8.0);
    }

    #[test]
    fn empty_candidate_list_is_rejected() {
        let dom = page();
        let mut manager = OverlayManager::default();
        let request = OpenRequest::new("menu", LayerType::Portal).anchored(
            "button",
            "menu",
            PlacementStrategy::Auto(Some(Vec::new())),
        );
        assert_eq!(
            manager.open(request, &dom),
            Err(OverlayError::Core(perch_core::Error::NoViableOverlay))
        );
    }

    #[test]
    fn confirm_opened_focuses_the_first_trapped_control() {
        let mut dom = page();
        dom.element("dialog", None)
            .button("name", "dialog", "Name")
            .button("save", "dialog", "Save");
        dom.focus("button");
        let mut manager = OverlayManager::default();
        let id = manager
            .open(
                OpenRequest::new("dialog", LayerType::Modal).trap_focus("dialog"),
                &dom,
            )
            .expect("open")
            .id;
        assert_eq!(
            manager.confirm_opened(&id, &dom),
            Ok(Some(ElementId::from("name")))
        );
    }

    #[test]
    fn unsubscribed_listeners_stop_receiving() {
        let dom = page();
        let mut manager = OverlayManager::default();
        let log = Rc::new(RefCell::new(0_usize));
        let sink = Rc::clone(&log);
        let subscription = manager.subscribe(move |_| *sink.borrow_mut() += 1);
        manager.open(menu_request(), &dom).expect("open");
        assert!(manager.unsubscribe(subscription));
        manager
            .close(&OverlayId::from("menu"), CloseReason::Explicit)
            .expect("close");
        assert_eq!(*log.borrow(), 2);
    }
}
