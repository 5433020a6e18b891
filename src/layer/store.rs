//! Layer store - the single owner and writer of layer records

use indexmap::IndexMap;

use super::clock::{Clock, MonotonicClock};
use super::{ImageSource, Layer, LayerId, PlacementStatus};
use crate::geometry::{Position, Size, SizeLimits};

/// Authoritative id -> layer mapping.
///
/// Insertion ordered internally; [`LayerStore::render_order`] derives the
/// back-to-front stacking from `last_modified`.
pub struct LayerStore {
    layers: IndexMap<LayerId, Layer>,
    next_id: u64,
    limits: SizeLimits,
    clock: Box<dyn Clock>,
}

impl std::fmt::Debug for LayerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerStore")
            .field("layers", &self.layers.len())
            .field("next_id", &self.next_id)
            .field("limits", &self.limits)
            .finish()
    }
}

impl LayerStore {
    /// Create an empty store with default size limits and a monotonic clock
    pub fn new() -> Self {
        Self::with_clock(SizeLimits::default(), Box::new(MonotonicClock::new()))
    }

    pub fn with_limits(limits: SizeLimits) -> Self {
        Self::with_clock(limits, Box::new(MonotonicClock::new()))
    }

    pub fn with_clock(limits: SizeLimits, clock: Box<dyn Clock>) -> Self {
        Self {
            layers: IndexMap::new(),
            next_id: 1,
            limits,
            clock,
        }
    }

    pub fn limits(&self) -> &SizeLimits {
        &self.limits
    }

    /// Allocate a new layer and append it.
    ///
    /// The initial size is taken as given; the minimum is enforced from the
    /// first resize on.
    pub fn create_layer(&mut self, content: ImageSource, position: Position, size: Size) -> Layer {
        let id = LayerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let layer = Layer {
            id,
            content,
            position,
            size,
            last_modified: self.clock.now(),
            placement: PlacementStatus::Unconfirmed,
        };

        tracing::info!(
            "Created {} from {} at ({}, {}) size {}x{}",
            id,
            layer.content.describe(),
            position.x,
            position.y,
            size.width,
            size.height
        );

        self.layers.insert(id, layer.clone());
        layer
    }

    /// Move a layer. Unknown ids are ignored.
    ///
    /// Returns whether a layer was updated.
    pub fn update_position(&mut self, id: LayerId, position: Position, confirm: bool) -> bool {
        let now = self.clock.now();
        let Some(layer) = self.layers.get_mut(&id) else {
            tracing::debug!("Ignoring position update for missing {}", id);
            return false;
        };

        layer.position = position;
        layer.last_modified = now;
        if confirm {
            layer.placement = PlacementStatus::Confirmed;
        }
        true
    }

    /// Resize a layer, clamped to the store's size limits. Unknown ids are ignored.
    pub fn update_size(&mut self, id: LayerId, size: Size) -> bool {
        let now = self.clock.now();
        let limits = self.limits;
        let Some(layer) = self.layers.get_mut(&id) else {
            tracing::debug!("Ignoring size update for missing {}", id);
            return false;
        };

        layer.size = size.clamp(&limits);
        layer.last_modified = now;
        true
    }

    /// All layers back-to-front: ascending `last_modified`, ties in insertion order
    pub fn render_order(&self) -> Vec<&Layer> {
        let mut ordered: Vec<&Layer> = self.layers.values().collect();
        // sort_by_key is stable, so equal timestamps keep insertion order
        ordered.sort_by_key(|layer| layer.last_modified);
        ordered
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    /// Layers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.values()
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Default for LayerStore {
    fn default() -> Self {
        Self::new()
    }
}
