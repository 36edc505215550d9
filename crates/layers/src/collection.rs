//! The engine-side layer list the refresh controller mutates.
//!
//! Engines implement [`LayerCollection`] over their own scene graph;
//! [`SceneLayers`] is a ready-made, thread-safe list for headless hosts and
//! tests.

use parking_lot::RwLock;

use crate::layer::{LayerId, SharedLayer};

pub trait LayerCollection: Send + Sync {
    fn add_layer(&self, layer: SharedLayer);

    /// Returns `true` if a layer with `id` was present.
    fn remove_layer(&self, id: LayerId) -> bool;

    fn contains(&self, id: LayerId) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes `old` (when given) and inserts `new`.
    ///
    /// Implementations that can do both under one lock should override this so
    /// readers never observe the list without either layer.
    fn replace_layer(&self, old: Option<LayerId>, new: SharedLayer) {
        if let Some(old) = old {
            self.remove_layer(old);
        }
        self.add_layer(new);
    }
}

/// Ordered layer list; later entries draw on top.
#[derive(Debug, Default)]
pub struct SceneLayers {
    layers: RwLock<Vec<SharedLayer>>,
}

impl SceneLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> Vec<LayerId> {
        self.layers.read().iter().map(|l| l.id()).collect()
    }

    pub fn snapshot(&self) -> Vec<SharedLayer> {
        self.layers.read().clone()
    }
}

impl LayerCollection for SceneLayers {
    fn add_layer(&self, layer: SharedLayer) {
        self.layers.write().push(layer);
    }

    fn remove_layer(&self, id: LayerId) -> bool {
        let mut layers = self.layers.write();
        let before = layers.len();
        layers.retain(|l| l.id() != id);
        layers.len() != before
    }

    fn contains(&self, id: LayerId) -> bool {
        self.layers.read().iter().any(|l| l.id() == id)
    }

    fn len(&self) -> usize {
        self.layers.read().len()
    }

    /// Swaps in place: the new layer takes the old one's draw position.
    fn replace_layer(&self, old: Option<LayerId>, new: SharedLayer) {
        let mut layers = self.layers.write();
        let slot = old.and_then(|old| layers.iter().position(|l| l.id() == old));
        match slot {
            Some(idx) => layers[idx] = new,
            None => layers.push(new),
        }
    }
}
