//! Click-outside detection.
//!
//! One registry stands in for a single document-level `pointerdown`
//! listener shared by every open overlay, instead of one listener each.

use perch_core::OverlayId;

use crate::host::{DomHost, ElementId};

#[derive(Debug, Clone)]
struct Registration {
    overlay: OverlayId,
    element: ElementId,
    exclude: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ClickOutside {
    registrations: Vec<Registration>,
}

impl ClickOutside {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Watch `element` on behalf of `overlay`.
    ///
    /// Pointer-downs on anything matching one of the `exclude` selectors (for
    /// example the trigger button) do not count as outside. Registering the
    /// same overlay again replaces its previous registration.
    pub fn register(
        &mut self,
        overlay: OverlayId,
        element: ElementId,
        exclude: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let attach = self.registrations.is_empty();
        self.registrations.retain(|r| r.overlay != overlay);
        self.registrations.push(Registration {
            overlay,
            element,
            exclude: exclude.into_iter().map(Into::into).collect(),
        });
        if attach {
            tracing::debug!("attaching document pointerdown listener");
        }
    }

    /// Returns `false` when `overlay` was not registered.
    pub fn unregister(&mut self, overlay: &OverlayId) -> bool {
        let before = self.registrations.len();
        self.registrations.retain(|r| &r.overlay != overlay);
        let removed = self.registrations.len() != before;
        if removed && self.registrations.is_empty() {
            tracing::debug!("detaching document pointerdown listener");
        }
        removed
    }

    /// Whether the shared document listener is needed.
    #[must_use]
    pub fn listener_attached(&self) -> bool {
        !self.registrations.is_empty()
    }

    /// Overlays that a pointer-down on `target` should dismiss, in
    /// registration order.
    #[must_use]
    pub fn pointer_down(&self, target: &ElementId, host: &impl DomHost) -> Vec<OverlayId> {
        self.registrations
            .iter()
            .filter(|r| !host.contains(&r.element, target))
            .filter(|r| !r.exclude.iter().any(|selector| host.closest(target, selector)))
            .map(|r| r.overlay.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::FakeDom;

    fn dom() -> FakeDom {
        let mut dom = FakeDom::new(1024.0, 768.0);
        dom.element("menu", None).element("menu-item", Some("menu"));
        dom.element("toggle", None).class("toggle", "menu-trigger");
        dom.element("toggle-icon", Some("toggle"));
        dom.element("page", None);
        dom
    }

    #[test]
    fn inside_clicks_do_not_dismiss() {
        let dom = dom();
        let mut detector = ClickOutside::new();
        detector.register(OverlayId::from("m"), ElementId::from("menu"), ["#nothing"]);
        assert!(detector
            .pointer_down(&ElementId::from("menu-item"), &dom)
            .is_empty());
    }

    #[test]
    fn outside_clicks_dismiss() {
        let dom = dom();
        let mut detector = ClickOutside::new();
        detector.register(OverlayId::from("m"), ElementId::from("menu"), Vec::<String>::new());
        assert_eq!(
            detector.pointer_down(&ElementId::from("page"), &dom),
            vec![OverlayId::from("m")]
        );
    }

    #[test]
    fn excluded_selector_prevents_dismissal() {
        let dom = dom();
        let mut detector = ClickOutside::new();
        detector.register(OverlayId::from("m"), ElementId::from("menu"), [".menu-trigger"]);
        assert!(detector
            .pointer_down(&ElementId::from("toggle-icon"), &dom)
            .is_empty());
        assert_eq!(detector.pointer_down(&ElementId::from("page"), &dom).len(), 1);
    }

    #[test]
    fn one_listener_for_many_registrations() {
        let mut detector = ClickOutside::new();
        assert!(!detector.listener_attached());
        detector.register(OverlayId::from("a"), ElementId::from("menu"), Vec::<String>::new());
        detector.register(OverlayId::from("b"), ElementId::from("page"), Vec::<String>::new());
        detector.register(OverlayId::from("a"), ElementId::from("menu"), Vec::<String>::new());
        assert!(detector.listener_attached());

        assert!(detector.unregister(&OverlayId::from("a")));
        assert!(!detector.unregister(&OverlayId::from("a")));
        assert!(detector.listener_attached());
        assert!(detector.unregister(&OverlayId::from("b")));
        assert!(!detector.listener_attached());
    }
}
