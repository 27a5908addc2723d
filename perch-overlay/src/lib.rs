//! Perch Overlay - overlay coordination for browser-style user interfaces
//!
//! Builds on `perch-core` (placement geometry, z-index stacking and the
//! open/close lifecycle) and adds the parts that talk to a live document:
//! click-outside dismissal, keyboard navigation, focus trapping, per-frame
//! repositioning and the page scroll lock.
//!
//! ## Quick Start
//!
//! ```no_run
//! use perch_overlay::{DomHost, OpenRequest, OverlayManager, PerchConfig, PlacementStrategy};
//! use perch_overlay::perch_core::{LayerType, Placement};
//!
//! fn open_menu(host: &impl DomHost) -> anyhow::Result<()> {
//!     let config = PerchConfig::load_default()?;
//!     let mut manager = OverlayManager::new(&config);
//!     let request = OpenRequest::new("file-menu", LayerType::Portal)
//!         .anchored("file-button", "file-menu", PlacementStrategy::Preferred(Placement::BottomStart))
//!         .dismiss_on_click_outside("file-menu", [".menu-trigger"])
//!         .navigable("file-menu");
//!     manager.open(request, host)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Nothing here is global. One [`OverlayManager`] per application instance
//! owns every registry and is handed to the DOM event handlers:
//!
//! 1. The host reports geometry and focus through [`DomHost`], re-queried on every call
//! 2. Handlers forward pointer, key, scroll and frame callbacks to the manager
//! 3. The manager updates its registries and returns what the host must do
//! 4. Lifecycle notifications are delivered to subscribers after each call

pub use perch_core;

// Public library modules
pub mod click_outside;
pub mod config;
pub mod error;
pub mod events;
pub mod focus_trap;
pub mod host;
pub mod input;
pub mod manager;
pub mod navigation;
pub mod scheduler;
pub mod scroll_lock;

#[cfg(test)]
mod test_helpers;

// Convenience re-exports
pub use config::{LoggingConfig, PerchConfig};
pub use error::{OverlayError, Result};
pub use events::{EventBus, SubscriptionId};
pub use host::{DomHost, ElementId, ElementState};
pub use input::{translate_dom_key, KeyCode, KeyEvent, KeyModifiers};
pub use manager::{Anchor, KeyOutcome, OpenRequest, OverlayManager, PlacementStrategy};
pub use navigation::{NavOutcome, NavigationOptions, Orientation};
