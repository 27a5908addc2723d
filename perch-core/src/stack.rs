//! Z-index allocation per layer type.
//!
//! Each layer type owns a base value (usually taken from theme tokens) and a
//! counter. Registering an overlay bumps the counter of its layer type and
//! hands out `base + counter * increment`, raised to one increment above the
//! highest active value when another layer already reaches that far. Later
//! overlays therefore render above every earlier one still on screen, and no
//! two active overlays share a value. When the last active overlay goes away
//! every counter starts over, which keeps values bounded across long sessions.

use std::fmt;

use foldhash::HashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::OverlayId;

/// Coarse z-index bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    /// Dropdowns, tooltips and other anchored popups.
    Portal,
    /// Dimming layer behind a modal.
    Backdrop,
    /// Dialogs that capture the whole page.
    Modal,
}

impl LayerType {
    pub const ALL: [LayerType; 3] = [LayerType::Portal, LayerType::Backdrop, LayerType::Modal];

    const fn index(self) -> usize {
        match self {
            LayerType::Portal => 0,
            LayerType::Backdrop => 1,
            LayerType::Modal => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            LayerType::Portal => "portal",
            LayerType::Backdrop => "backdrop",
            LayerType::Modal => "modal",
        }
    }
}

impl fmt::Display for LayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base z-index per layer type plus the step between consecutive overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerBases {
    pub portal: i32,
    pub backdrop: i32,
    pub modal: i32,
    pub increment: i32,
}

impl Default for LayerBases {
    fn default() -> Self {
        Self {
            portal: 1000,
            backdrop: 1040,
            modal: 1050,
            increment: 10,
        }
    }
}

impl LayerBases {
    #[must_use]
    pub const fn base(&self, layer: LayerType) -> i32 {
        match layer {
            LayerType::Portal => self.portal,
            LayerType::Backdrop => self.backdrop,
            LayerType::Modal => self.modal,
        }
    }
}

/// An allocated slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSlot {
    pub layer: LayerType,
    /// Position in registration order within the layer type, starting at 1.
    pub level: i32,
    pub z_index: i32,
}

#[derive(Debug, Default)]
pub struct ZIndexAllocator {
    bases: LayerBases,
    counters: [i32; 3],
    active: HashMap<OverlayId, LayerSlot>,
}

impl ZIndexAllocator {
    #[must_use]
    pub fn new(bases: LayerBases) -> Self {
        Self {
            bases,
            counters: [0; 3],
            active: HashMap::default(),
        }
    }

    /// Allocate a z-index for `id`, or return the one it already holds.
    pub fn register_layer(&mut self, id: &OverlayId, layer: LayerType) -> i32 {
        if let Some(slot) = self.active.get(id) {
            if slot.layer != layer {
                tracing::warn!(%id, held = %slot.layer, requested = %layer, "overlay already holds a slot in another layer");
            }
            return slot.z_index;
        }

        #[allow(clippy::indexing_slicing)]
        let counter = &mut self.counters[layer.index()];
        *counter = counter.saturating_add(1);
        let level = *counter;
        let floor = self
            .bases
            .base(layer)
            .saturating_add(level.saturating_mul(self.bases.increment));
        let above_active = self
            .active
            .values()
            .map(|slot| slot.z_index)
            .max()
            .map_or(i32::MIN, |top| top.saturating_add(self.bases.increment.max(1)));
        let z_index = floor.max(above_active);
        if z_index != floor {
            tracing::debug!(%id, %layer, floor, z_index, "raised above the active stack");
        }

        tracing::trace!(%id, %layer, level, z_index, "registered layer");
        self.active.insert(
            id.clone(),
            LayerSlot {
                layer,
                level,
                z_index,
            },
        );
        z_index
    }

    /// Release the slot held by `id`.
    pub fn unregister_layer(&mut self, id: &OverlayId) -> Result<LayerSlot> {
        let slot = self
            .active
            .remove(id)
            .ok_or_else(|| Error::UnknownOverlayId(id.clone()))?;
        if self.active.is_empty() {
            tracing::trace!("last layer released, resetting counters");
            self.counters = [0; 3];
        }
        Ok(slot)
    }

    #[must_use]
    pub fn slot(&self, id: &OverlayId) -> Option<LayerSlot> {
        self.active.get(id).copied()
    }

    #[must_use]
    pub fn z_index(&self, id: &OverlayId) -> Option<i32> {
        self.slot(id).map(|slot| slot.z_index)
    }

    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// The id holding the highest z-index.
    #[must_use]
    pub fn topmost(&self) -> Option<&OverlayId> {
        self.active
            .iter()
            .max_by_key(|(_, slot)| slot.z_index)
            .map(|(id, _)| id)
    }
}
