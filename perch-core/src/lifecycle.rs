//! Overlay lifecycle coordinator.
//!
//! Per overlay id the state machine is `opening -> open -> closing`, after
//! which the record is removed. The coordinator is the only writer of that
//! state. It never calls out to subscribers directly: notifications are
//! queued and the owner drains them with [`OverlayCoordinator::drain_events`]
//! once the current call has returned.
//!
//! Opening an overlay asks every live overlay of a *different* layer type
//! with a *strictly lower* priority to close. The request is cooperative;
//! nothing is torn down until the owner confirms it.

use std::collections::VecDeque;
use std::fmt;

use foldhash::HashMap;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::position::PositionResult;
use crate::stack::{LayerBases, LayerType, ZIndexAllocator};
use crate::OverlayId;

/// Lifecycle state of a tracked overlay. `closed` is represented by absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayStatus {
    Opening,
    Open,
    Closing,
}

impl fmt::Display for OverlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverlayStatus::Opening => "opening",
            OverlayStatus::Open => "open",
            OverlayStatus::Closing => "closing",
        })
    }
}

/// Why a close was requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum CloseReason {
    /// The owning component asked for it.
    Explicit,
    /// Escape was pressed while this was the topmost overlay.
    Escape,
    /// A pointer went down outside the overlay.
    ClickOutside,
    /// A higher-priority overlay of another layer type is opening.
    Excluded { by: OverlayId },
}

/// Notifications for rendering collaborators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case", tag = "event")]
pub enum OverlayEvent {
    OpenRequested {
        id: OverlayId,
        layer_type: LayerType,
        z_index: i32,
    },
    OpenConfirmed {
        id: OverlayId,
    },
    CloseRequested {
        id: OverlayId,
        reason: CloseReason,
    },
    Closed {
        id: OverlayId,
    },
    PlacementComputed {
        id: OverlayId,
        result: PositionResult,
    },
}

impl OverlayEvent {
    /// The overlay this notification is about.
    #[must_use]
    pub fn id(&self) -> &OverlayId {
        match self {
            OverlayEvent::OpenRequested { id, .. }
            | OverlayEvent::OpenConfirmed { id }
            | OverlayEvent::CloseRequested { id, .. }
            | OverlayEvent::Closed { id }
            | OverlayEvent::PlacementComputed { id, .. } => id,
        }
    }
}

/// Bookkeeping for one live overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverlayRecord {
    pub id: OverlayId,
    pub layer_type: LayerType,
    pub level: i32,
    pub z_index: i32,
    pub status: OverlayStatus,
    pub priority: i32,
    /// A close request is outstanding for this open cycle.
    pub close_requested: bool,
}

impl OverlayRecord {
    /// `opening` counts as open so two exclusive overlays never coexist
    /// during an opening transition.
    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.status, OverlayStatus::Opening | OverlayStatus::Open)
    }
}

#[derive(Debug, Default)]
pub struct OverlayCoordinator {
    records: HashMap<OverlayId, OverlayRecord>,
    stack: ZIndexAllocator,
    pending: VecDeque<OverlayEvent>,
}

impl OverlayCoordinator {
    #[must_use]
    pub fn new(bases: LayerBases) -> Self {
        Self {
            records: HashMap::default(),
            stack: ZIndexAllocator::new(bases),
            pending: VecDeque::new(),
        }
    }

    /// Start opening `id`.
    ///
    /// Asking again for an overlay that is already opening or open returns its
    /// record unchanged. Asking while it is closing is a state violation: the
    /// caller must wait for [`Self::confirm_closed`] first.
    pub fn request_open(
        &mut self,
        id: impl Into<OverlayId>,
        layer_type: LayerType,
        priority: i32,
    ) -> Result<OverlayRecord> {
        let id = id.into();
        if let Some(existing) = self.records.get(&id) {
            return if existing.is_open() {
                tracing::debug!(%id, "open requested for an overlay that is already open");
                Ok(existing.clone())
            } else {
                Err(Error::StateViolation {
                    id,
                    action: "request open",
                    status: Some(existing.status),
                })
            };
        }

        let mut excluded: Vec<&mut OverlayRecord> = self
            .records
            .values_mut()
            .filter(|record| {
                record.is_open()
                    && !record.close_requested
                    && record.layer_type != layer_type
                    && record.priority < priority
            })
            .collect();
        excluded.sort_by_key(|record| record.z_index);
        for record in excluded {
            tracing::debug!(id = %record.id, by = %id, "excluding lower-priority overlay");
            record.close_requested = true;
            self.pending.push_back(OverlayEvent::CloseRequested {
                id: record.id.clone(),
                reason: CloseReason::Excluded { by: id.clone() },
            });
        }

        let z_index = self.stack.register_layer(&id, layer_type);
        let level = self.stack.slot(&id).map_or(0, |slot| slot.level);
        let record = OverlayRecord {
            id: id.clone(),
            layer_type,
            level,
            z_index,
            status: OverlayStatus::Opening,
            priority,
            close_requested: false,
        };
        self.records.insert(id.clone(), record.clone());
        self.pending.push_back(OverlayEvent::OpenRequested {
            id,
            layer_type,
            z_index,
        });
        Ok(record)
    }

    /// `opening -> open`.
    pub fn confirm_opened(&mut self, id: &OverlayId) -> Result<()> {
        let record = self.records.get_mut(id).ok_or_else(|| Error::StateViolation {
            id: id.clone(),
            action: "confirm opened",
            status: None,
        })?;
        if record.status != OverlayStatus::Opening {
            return Err(Error::StateViolation {
                id: id.clone(),
                action: "confirm opened",
                status: Some(record.status),
            });
        }
        record.status = OverlayStatus::Open;
        self.pending
            .push_back(OverlayEvent::OpenConfirmed { id: id.clone() });
        Ok(())
    }

    /// Ask the owner of `id` to close it.
    ///
    /// Only the first request of an open cycle is forwarded. Requests for an
    /// overlay that is already closing are ignored.
    pub fn request_close(&mut self, id: &OverlayId, reason: CloseReason) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::UnknownOverlayId(id.clone()))?;
        if !record.is_open() || record.close_requested {
            tracing::trace!(%id, status = %record.status, "close already underway");
            return Ok(());
        }
        record.close_requested = true;
        self.pending.push_back(OverlayEvent::CloseRequested {
            id: id.clone(),
            reason,
        });
        Ok(())
    }

    /// `opening | open -> closing`.
    pub fn confirm_closing(&mut self, id: &OverlayId) -> Result<()> {
        let record = self
            .records
            .get_mut(id)
            .ok_or_else(|| Error::UnknownOverlayId(id.clone()))?;
        if !record.is_open() {
            return Err(Error::StateViolation {
                id: id.clone(),
                action: "confirm closing",
                status: Some(record.status),
            });
        }
        record.status = OverlayStatus::Closing;
        Ok(())
    }

    /// Remove `id` and release its z-index.
    ///
    /// Allowed from any live state, so an open can be cancelled right after
    /// [`Self::request_open`].
    pub fn confirm_closed(&mut self, id: &OverlayId) -> Result<OverlayRecord> {
        let record = self
            .records
            .remove(id)
            .ok_or_else(|| Error::UnknownOverlayId(id.clone()))?;
        self.stack.unregister_layer(id)?;
        self.pending
            .push_back(OverlayEvent::Closed { id: id.clone() });
        Ok(record)
    }

    /// Queue a placement notification for a live overlay.
    pub fn notify_placement(&mut self, id: &OverlayId, result: PositionResult) -> Result<()> {
        if !self.records.contains_key(id) {
            return Err(Error::UnknownOverlayId(id.clone()));
        }
        self.pending.push_back(OverlayEvent::PlacementComputed {
            id: id.clone(),
            result,
        });
        Ok(())
    }

    /// True while `id` is opening or open.
    #[must_use]
    pub fn is_open(&self, id: &OverlayId) -> bool {
        self.records.get(id).is_some_and(OverlayRecord::is_open)
    }

    #[must_use]
    pub fn record(&self, id: &OverlayId) -> Option<&OverlayRecord> {
        self.records.get(id)
    }

    /// Live records in stacking order, optionally restricted to one layer type.
    #[must_use]
    pub fn list_open(&self, layer_type: Option<LayerType>) -> Vec<&OverlayRecord> {
        let mut records: Vec<&OverlayRecord> = self
            .records
            .values()
            .filter(|record| layer_type.is_none_or(|layer| record.layer_type == layer))
            .collect();
        records.sort_by_key(|record| (record.z_index, record.level));
        records
    }

    /// The highest open overlay without an outstanding close request.
    #[must_use]
    pub fn topmost(&self) -> Option<&OverlayRecord> {
        self.records
            .values()
            .filter(|record| record.is_open() && !record.close_requested)
            .max_by_key(|record| record.z_index)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Take every queued notification, oldest first.
    pub fn drain_events(&mut self) -> Vec<OverlayEvent> {
        self.pending.drain(..).collect()
    }
}
