use std::sync::Arc;

use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct LayerId(pub u64);

impl std::fmt::Display for LayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Anything the engine can hold in its layer list.
pub trait Layer: std::fmt::Debug + Send + Sync {
    fn id(&self) -> LayerId;

    fn name(&self) -> &str;

    /// Downcasting hook for engines that need the concrete layer type.
    fn as_any(&self) -> &dyn std::any::Any;
}

pub type SharedLayer = Arc<dyn Layer>;
