//! Test helpers for overlay tests.
//!
//! `FakeDom` is an in-memory document implementing [`DomHost`]. Nodes are
//! kept in insertion order, which doubles as document order, and builder
//! methods chain so a tree reads top to bottom:
//!
//! ```ignore
//! let mut dom = FakeDom::new(1024.0, 768.0);
//! dom.element("menu", None)
//!     .option("copy", "menu", "Copy")
//!     .option("paste", "menu", "Paste");
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use perch_core::{OverlayEvent, Rect, Viewport};

use crate::host::{DomHost, ElementId, ElementState};
use crate::input::{KeyCode, KeyEvent, KeyModifiers};
use crate::manager::OverlayManager;

#[derive(Debug, Clone)]
struct Node {
    parent: Option<ElementId>,
    classes: Vec<String>,
    rect: Rect,
    state: ElementState,
}

#[derive(Debug, Clone)]
pub struct FakeDom {
    viewport: Viewport,
    nodes: Vec<Node>,
    focused: Option<ElementId>,
}

impl FakeDom {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            viewport: Viewport::new(width, height),
            nodes: Vec::new(),
            focused: None,
        }
    }

    fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.state.id.as_str() == id)
    }

    fn node_mut(&mut self, id: &str) -> &mut Node {
        self.nodes
            .iter_mut()
            .find(|node| node.state.id.as_str() == id)
            .unwrap_or_else(|| panic!("no element `{id}` in the fake document"))
    }

    fn insert(&mut self, id: &str, parent: Option<&str>, state: ElementState) -> &mut Self {
        self.nodes.push(Node {
            parent: parent.map(ElementId::from),
            classes: Vec::new(),
            rect: Rect::default(),
            state: ElementState {
                id: ElementId::from(id),
                visible: true,
                ..state
            },
        });
        self
    }

    /// Plain visible element.
    pub fn element(&mut self, id: &str, parent: Option<&str>) -> &mut Self {
        self.insert(id, parent, ElementState::default())
    }

    /// Navigable list item labelled `label`.
    pub fn option(&mut self, id: &str, parent: &str, label: &str) -> &mut Self {
        self.insert(
            id,
            Some(parent),
            ElementState {
                label: label.to_string(),
                navigable: true,
                ..ElementState::default()
            },
        )
    }

    /// Tabbable control labelled `label`.
    pub fn button(&mut self, id: &str, parent: &str, label: &str) -> &mut Self {
        self.insert(
            id,
            Some(parent),
            ElementState {
                label: label.to_string(),
                tabbable: true,
                ..ElementState::default()
            },
        )
    }

    pub fn class(&mut self, id: &str, class: &str) -> &mut Self {
        self.node_mut(id).classes.push(class.to_string());
        self
    }

    pub fn rect(&mut self, id: &str, rect: Rect) -> &mut Self {
        self.node_mut(id).rect = rect;
        self
    }

    pub fn disable(&mut self, id: &str) -> &mut Self {
        self.node_mut(id).state.disabled = true;
        self
    }

    pub fn hide(&mut self, id: &str) -> &mut Self {
        self.node_mut(id).state.visible = false;
        self
    }

    pub fn aria_hide(&mut self, id: &str) -> &mut Self {
        self.node_mut(id).state.aria_hidden = true;
        self
    }

    pub fn focus(&mut self, id: &str) -> &mut Self {
        self.focused = Some(ElementId::from(id));
        self
    }

    /// Detach an element and its subtree.
    pub fn remove(&mut self, id: &str) -> &mut Self {
        let removed = ElementId::from(id);
        let doomed: Vec<ElementId> = self
            .nodes
            .iter()
            .filter(|node| self.contains(&removed, &node.state.id))
            .map(|node| node.state.id.clone())
            .collect();
        self.nodes.retain(|node| !doomed.contains(&node.state.id));
        if self.focused.as_ref().is_some_and(|focused| doomed.contains(focused)) {
            self.focused = None;
        }
        self
    }

    fn matches(node: &Node, selector: &str) -> bool {
        if let Some(class) = selector.strip_prefix('.') {
            node.classes.iter().any(|existing| existing == class)
        } else if let Some(id) = selector.strip_prefix('#') {
            node.state.id.as_str() == id
        } else {
            false
        }
    }
}

impl DomHost for FakeDom {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn bounding_rect(&self, element: &ElementId) -> Option<Rect> {
        self.node(element.as_str()).map(|node| node.rect)
    }

    fn contains(&self, ancestor: &ElementId, node: &ElementId) -> bool {
        let mut current = Some(node.clone());
        while let Some(id) = current {
            if &id == ancestor {
                return true;
            }
            current = self.node(id.as_str()).and_then(|node| node.parent.clone());
        }
        false
    }

    fn closest(&self, node: &ElementId, selector: &str) -> bool {
        let mut current = self.node(node.as_str());
        while let Some(candidate) = current {
            if Self::matches(candidate, selector) {
                return true;
            }
            current = candidate
                .parent
                .as_ref()
                .and_then(|parent| self.node(parent.as_str()));
        }
        false
    }

    fn descendants(&self, container: &ElementId) -> Vec<ElementState> {
        self.nodes
            .iter()
            .filter(|node| {
                &node.state.id != container && self.contains(container, &node.state.id)
            })
            .map(|node| node.state.clone())
            .collect()
    }

    fn active_element(&self) -> Option<ElementId> {
        self.focused.clone()
    }
}

/// Plain character key press.
pub fn key(ch: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(ch))
}

/// Non-character key press.
pub fn special_key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code)
}

/// Shift+Tab.
pub fn shift_tab() -> KeyEvent {
    KeyEvent::new(KeyCode::Tab).with_modifiers(KeyModifiers::SHIFT)
}

/// Subscribe a recorder to `manager` and return the shared log it fills.
pub fn record_events(manager: &mut OverlayManager) -> Rc<RefCell<Vec<OverlayEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    manager.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    log
}
