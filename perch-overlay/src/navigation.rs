//! Roving keyboard navigation over a live list of items.
//!
//! Only one navigation context is active at a time. Items are re-queried
//! from the host on every key because the list can change between events;
//! the highlight is remembered by element id, not by index.

use perch_core::{OverlayId, Rect};
use serde::Deserialize;

use crate::host::{DomHost, ElementId, ElementState};
use crate::input::{KeyCode, KeyEvent};

/// Which arrow keys move the highlight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Orientation {
    /// Up/Down.
    #[default]
    Vertical,
    /// Left/Right.
    Horizontal,
    /// All four arrows.
    Both,
}

/// Navigation behavior, usually from the `[navigation]` config table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NavigationOptions {
    /// Moving past either end continues at the other end.
    pub wrap: bool,
    pub orientation: Orientation,
    /// Items skipped by PageUp/PageDown.
    pub page_size: usize,
    /// Printable keys jump to the next item starting with that character.
    pub typeahead: bool,
}

impl Default for NavigationOptions {
    fn default() -> Self {
        Self {
            wrap: true,
            orientation: Orientation::Vertical,
            page_size: 10,
            typeahead: true,
        }
    }
}

/// Scroll needed to bring the highlighted item into its container's view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollDelta {
    pub x: f64,
    pub y: f64,
}

/// Result of feeding a key to the active context.
#[derive(Debug, Clone, PartialEq)]
pub enum NavOutcome {
    /// The key was not for us.
    Ignored,
    Highlighted {
        index: usize,
        element: ElementId,
        /// `None` when the item is already fully visible.
        scroll: Option<ScrollDelta>,
    },
    Selected {
        index: usize,
        element: ElementId,
    },
    Cancelled,
}

#[derive(Debug, Clone)]
struct NavigationContext {
    owner: OverlayId,
    container: ElementId,
    options: NavigationOptions,
    highlighted: Option<ElementId>,
}

#[derive(Debug, Default)]
pub struct NavigationController {
    active: Option<NavigationContext>,
}

enum Step {
    Next,
    Prev,
    First,
    Last,
    PageDown,
    PageUp,
}

impl NavigationController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `container` the active navigation context, replacing any other.
    pub fn activate(&mut self, owner: OverlayId, container: ElementId, options: NavigationOptions) {
        if let Some(previous) = &self.active {
            tracing::debug!(previous = %previous.owner, next = %owner, "replacing navigation context");
        }
        self.active = Some(NavigationContext {
            owner,
            container,
            options,
            highlighted: None,
        });
    }

    /// Drop the context if it belongs to `owner`. Returns whether it did.
    pub fn deactivate(&mut self, owner: &OverlayId) -> bool {
        if self.active.as_ref().is_some_and(|ctx| &ctx.owner == owner) {
            self.active = None;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn owner(&self) -> Option<&OverlayId> {
        self.active.as_ref().map(|ctx| &ctx.owner)
    }

    #[must_use]
    pub fn highlighted(&self) -> Option<&ElementId> {
        self.active.as_ref()?.highlighted.as_ref()
    }

    pub fn handle_key(&mut self, key: &KeyEvent, host: &impl DomHost) -> NavOutcome {
        let Some(ctx) = self.active.as_mut() else {
            return NavOutcome::Ignored;
        };

        let items: Vec<ElementState> = host
            .descendants(&ctx.container)
            .into_iter()
            .filter(ElementState::is_navigable)
            .collect();
        let current = ctx
            .highlighted
            .as_ref()
            .and_then(|id| items.iter().position(|item| &item.id == id));

        let step = match (key.code, ctx.options.orientation) {
            (KeyCode::Esc, _) => return NavOutcome::Cancelled,
            (KeyCode::Enter | KeyCode::Char(' '), _) => {
                return match (current, ctx.highlighted.clone()) {
                    (Some(index), Some(element)) => NavOutcome::Selected { index, element },
                    _ => NavOutcome::Ignored,
                };
            }
            (KeyCode::Down, Orientation::Vertical | Orientation::Both)
            | (KeyCode::Right, Orientation::Horizontal | Orientation::Both) => Step::Next,
            (KeyCode::Up, Orientation::Vertical | Orientation::Both)
            | (KeyCode::Left, Orientation::Horizontal | Orientation::Both) => Step::Prev,
            (KeyCode::Home, _) => Step::First,
            (KeyCode::End, _) => Step::Last,
            (KeyCode::PageDown, _) => Step::PageDown,
            (KeyCode::PageUp, _) => Step::PageUp,
            (KeyCode::Char(ch), _) if ctx.options.typeahead && !key.has_command_modifier() => {
                return match typeahead(&items, current, ch) {
                    Some(index) => highlight(ctx, &items, index, host),
                    None => NavOutcome::Ignored,
                };
            }
            _ => return NavOutcome::Ignored,
        };

        let Some(last) = items.len().checked_sub(1) else {
            return NavOutcome::Ignored;
        };
        let wrap = ctx.options.wrap;
        let page = ctx.options.page_size.max(1);
        let index = match (step, current) {
            (Step::First, _) | (Step::Next, None) => 0,
            (Step::Last, _) | (Step::Prev, None) => last,
            (Step::Next, Some(i)) if i < last => i + 1,
            (Step::Next, Some(i)) => {
                if wrap {
                    0
                } else {
                    i
                }
            }
            (Step::Prev, Some(i)) if i > 0 => i - 1,
            (Step::Prev, Some(_)) => {
                if wrap {
                    last
                } else {
                    0
                }
            }
            (Step::PageDown, current) => current.map_or(0, |i| (i + page).min(last)),
            (Step::PageUp, current) => current.map_or(0, |i| i.saturating_sub(page)),
        };
        highlight(ctx, &items, index, host)
    }
}

fn highlight(
    ctx: &mut NavigationContext,
    items: &[ElementState],
    index: usize,
    host: &impl DomHost,
) -> NavOutcome {
    let Some(item) = items.get(index) else {
        return NavOutcome::Ignored;
    };
    ctx.highlighted = Some(item.id.clone());

    let scroll = match (host.bounding_rect(&ctx.container), host.bounding_rect(&item.id)) {
        (Some(view), Some(rect)) => scroll_into_view(&view, &rect),
        _ => None,
    };
    tracing::trace!(index, element = %item.id, ?scroll, "highlighted item");
    NavOutcome::Highlighted {
        index,
        element: item.id.clone(),
        scroll,
    }
}

/// Next item after `current` whose label starts with `ch`, searching cyclically.
fn typeahead(items: &[ElementState], current: Option<usize>, ch: char) -> Option<usize> {
    let needle = ch.to_lowercase().collect::<String>();
    let start = current.map_or(0, |i| i + 1);
    (0..items.len())
        .map(|offset| (start + offset) % items.len())
        .find(|&i| {
            items
                .get(i)
                .is_some_and(|item| item.label.to_lowercase().starts_with(&needle))
        })
}

/// Smallest scroll that makes `item` fully visible inside `view`.
#[must_use]
pub fn scroll_into_view(view: &Rect, item: &Rect) -> Option<ScrollDelta> {
    let axis = |start: f64, end: f64, view_start: f64, view_end: f64| {
        if start < view_start {
            start - view_start
        } else if end > view_end {
            (end - view_end).min(start - view_start)
        } else {
            0.0
        }
    };
    let x = axis(item.left(), item.right(), view.left(), view.right());
    let y = axis(item.top(), item.bottom(), view.top(), view.bottom());
    (x != 0.0 || y != 0.0).then_some(ScrollDelta { x, y })
}
