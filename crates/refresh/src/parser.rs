use std::sync::Arc;

use formats::geojson::OverlayDocument;
use layers::{LayerId, OverlayLayer, SharedLayer};

use crate::error::ParseError;

/// Turns fetched bytes into an engine layer.
///
/// Runs on the blocking pool, so implementations may be CPU heavy.
pub trait OverlayParser: Send + Sync {
    fn parse(&self, id: LayerId, name: &str, payload: &[u8]) -> Result<SharedLayer, ParseError>;
}

#[derive(Debug, Default, Copy, Clone)]
pub struct GeoJsonParser;

impl OverlayParser for GeoJsonParser {
    fn parse(&self, id: LayerId, name: &str, payload: &[u8]) -> Result<SharedLayer, ParseError> {
        let document = OverlayDocument::from_geojson_slice(payload)?;
        Ok(Arc::new(OverlayLayer::new(id, name, document)))
    }
}
