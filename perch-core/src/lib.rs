//! Perch core - positioning, stacking and lifecycle bookkeeping for overlays.
//!
//! This crate holds the pure parts of the overlay engine:
//!
//! - [`position`]: where a floating element goes relative to its trigger,
//!   with flip-on-overflow and viewport clamping.
//! - [`stack`]: z-index allocation per layer type.
//! - [`lifecycle`]: the open/close state machine and priority-based exclusion
//!   between overlays of different layer types.
//!
//! Nothing here touches a DOM. Geometry comes in as plain rectangles and
//! notifications go out as queued [`lifecycle::OverlayEvent`] values.
//!
//! ```
//! use perch_core::{compute_placement, Placement, PositionOptions, Rect, Viewport};
//!
//! let result = compute_placement(
//!     &Rect::new(10.0, 500.0, 50.0, 20.0),
//!     &Rect::new(0.0, 0.0, 200.0, 300.0),
//!     Placement::Top,
//!     &PositionOptions::default(),
//!     &Viewport::new(1024.0, 768.0),
//! )?;
//! assert_eq!((result.x, result.y), (8.0, 192.0));
//! # Ok::<(), perch_core::Error>(())
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub mod error;
pub mod geometry;
pub mod lifecycle;
pub mod placement;
pub mod position;
pub mod stack;

pub use error::{Error, Result};
pub use geometry::{Overflow, Rect, Viewport};
pub use lifecycle::{CloseReason, OverlayCoordinator, OverlayEvent, OverlayRecord, OverlayStatus};
pub use placement::{Align, Placement, Side};
pub use position::{
    auto_position, compute_placement, score_candidates, PositionOptions, PositionResult,
};
pub use stack::{LayerBases, LayerSlot, LayerType, ZIndexAllocator};

/// Identifier of an overlay instance, usually the id of its root element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(Arc<str>);

impl OverlayId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OverlayId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl From<String> for OverlayId {
    fn from(value: String) -> Self {
        Self(Arc::from(value))
    }
}

impl Borrow<str> for OverlayId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
