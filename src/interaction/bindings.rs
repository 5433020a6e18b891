//! Standing gesture bindings, one per layer
//!
//! A binding is created once when a layer's render target first appears and
//! kept for the layer's lifetime, so mutations never trigger re-binding.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::layer::{LayerId, LayerStore};

/// Opaque handle of a layer's rendered element in the UI shell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetHandle(pub u64);

/// Lookup of rendered elements owned by the shell
pub trait RenderTargets {
    /// The element currently rendering `id`, if it exists yet
    fn resolve(&self, id: LayerId) -> Option<TargetHandle>;
}

/// Targets for a shell-less session: every layer renders as itself
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessTargets;

impl RenderTargets for HeadlessTargets {
    fn resolve(&self, id: LayerId) -> Option<TargetHandle> {
        Some(TargetHandle(id.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub layer: LayerId,
    pub target: TargetHandle,
}

#[derive(Debug, Default)]
pub struct BindingRegistry {
    bindings: HashMap<LayerId, Binding>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a binding for `id` unless one exists.
    ///
    /// Returns `false` when the render target cannot be found; the caller
    /// retries on the next sync.
    pub fn bind(&mut self, id: LayerId, targets: &dyn RenderTargets) -> bool {
        if self.bindings.contains_key(&id) {
            return true;
        }
        match targets.resolve(id) {
            Some(target) => {
                self.bindings.insert(id, Binding { layer: id, target });
                tracing::debug!("Bound gestures for {} to target {:?}", id, target);
                true
            }
            None => {
                tracing::debug!("No render target for {} yet, skipping binding", id);
                false
            }
        }
    }

    /// Bind every layer in `store` that has no binding yet.
    ///
    /// Returns the number of new bindings.
    pub fn sync(&mut self, store: &LayerStore, targets: &dyn RenderTargets) -> usize {
        let pending: Vec<LayerId> = store
            .iter()
            .map(|layer| layer.id())
            .filter(|id| !self.bindings.contains_key(id))
            .collect();

        pending
            .into_iter()
            .filter(|id| self.bind(*id, targets))
            .count()
    }

    /// Drop the binding of a removed layer
    pub fn unbind(&mut self, id: LayerId) -> Option<Binding> {
        self.bindings.remove(&id)
    }

    pub fn get(&self, id: LayerId) -> Option<&Binding> {
        self.bindings.get(&id)
    }

    pub fn is_bound(&self, id: LayerId) -> bool {
        self.bindings.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
