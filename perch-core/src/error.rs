//! Error taxonomy shared by the positioning engine, the z-index allocator
//! and the lifecycle coordinator.
//!
//! Every variant describes a misuse of the API. Nothing here is transient,
//! so callers should surface these immediately instead of retrying.

use crate::lifecycle::OverlayStatus;
use crate::OverlayId;

/// Result alias used throughout `perch-core`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A trigger or content rectangle with a zero, negative or non-finite size.
    #[error("invalid {what} geometry: {width}x{height}")]
    InvalidGeometry {
        what: &'static str,
        width: f64,
        height: f64,
    },

    /// `auto_position` was called with no candidate placements.
    #[error("no candidate placement to choose from")]
    NoViableOverlay,

    /// The id is not tracked by the allocator or coordinator.
    #[error("unknown overlay id `{0}`")]
    UnknownOverlayId(OverlayId),

    /// A lifecycle transition that is not allowed from the current state.
    #[error("overlay `{id}` cannot {action} while {}", describe(.status))]
    StateViolation {
        id: OverlayId,
        action: &'static str,
        status: Option<OverlayStatus>,
    },
}

fn describe(status: &Option<OverlayStatus>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => "not requested".to_string(),
    }
}
