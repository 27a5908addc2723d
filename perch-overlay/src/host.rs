//! Live DOM queries, supplied by the embedding application.
//!
//! Layout can change between any two callbacks, so nothing in this crate
//! keeps rectangles or element lists around. Every decision re-asks the host.

use std::fmt;
use std::sync::Arc;

use perch_core::{Rect, Viewport};
use serde::{Deserialize, Serialize};

/// Identifier of an element in the host document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(Arc<str>);

impl ElementId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

/// What the host knows about one descendant of a container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ElementState {
    pub id: ElementId,
    /// Text used for type-ahead matching.
    pub label: String,
    /// Reachable with Tab (native control or non-negative tabindex).
    pub tabbable: bool,
    /// Part of a navigable list (`role="option"`, `role="menuitem"`, ...).
    pub navigable: bool,
    /// Rendered with a non-empty box.
    pub visible: bool,
    /// `disabled` or `aria-disabled="true"`.
    pub disabled: bool,
    pub aria_hidden: bool,
}

impl ElementState {
    /// Can receive focus inside a focus trap.
    #[must_use]
    pub fn is_focusable(&self) -> bool {
        self.tabbable && self.visible && !self.disabled && !self.aria_hidden
    }

    /// Can be highlighted by keyboard navigation.
    #[must_use]
    pub fn is_navigable(&self) -> bool {
        self.navigable && self.visible && !self.disabled
    }
}

/// Capability to query the live document.
pub trait DomHost {
    /// Current viewport size and scroll offsets.
    fn viewport(&self) -> Viewport;

    /// Bounding client rect, or `None` when the element is not in the document.
    fn bounding_rect(&self, element: &ElementId) -> Option<Rect>;

    /// Whether `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &ElementId, node: &ElementId) -> bool;

    /// Whether `node` or any of its ancestors matches `selector`.
    fn closest(&self, node: &ElementId, selector: &str) -> bool;

    /// Descendants of `container` in document order.
    fn descendants(&self, container: &ElementId) -> Vec<ElementState>;

    /// The element that currently has focus.
    fn active_element(&self) -> Option<ElementId>;
}
