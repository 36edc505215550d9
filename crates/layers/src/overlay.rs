use foundation::bounds::GeoBounds;
use formats::geojson::{OverlayDocument, OverlayGeometry};

use crate::layer::{Layer, LayerId};

/// A parsed GeoJSON overlay ready to hand to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayer {
    id: LayerId,
    name: String,
    document: OverlayDocument,
    bounds: Option<GeoBounds>,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct OverlaySummary {
    pub features: usize,
    pub points: usize,
    pub lines: usize,
    pub areas: usize,
}

impl OverlayLayer {
    pub fn new(id: LayerId, name: impl Into<String>, document: OverlayDocument) -> Self {
        let bounds = document.bounds();
        Self {
            id,
            name: name.into(),
            document,
            bounds,
        }
    }

    pub fn document(&self) -> &OverlayDocument {
        &self.document
    }

    pub fn bounds(&self) -> Option<GeoBounds> {
        self.bounds
    }

    /// Counts drawable primitives by kind; multi-geometries count each part.
    pub fn summary(&self) -> OverlaySummary {
        let mut out = OverlaySummary {
            features: self.document.len(),
            ..OverlaySummary::default()
        };
        for geometry in self.document.features.iter().filter_map(|f| f.geometry.as_ref()) {
            tally(geometry, &mut out);
        }
        out
    }
}

fn tally(geometry: &OverlayGeometry, out: &mut OverlaySummary) {
    match geometry {
        OverlayGeometry::Point(_) => out.points += 1,
        OverlayGeometry::MultiPoint(ps) => out.points += ps.len(),
        OverlayGeometry::LineString(_) => out.lines += 1,
        OverlayGeometry::MultiLineString(lines) => out.lines += lines.len(),
        OverlayGeometry::Polygon(_) => out.areas += 1,
        OverlayGeometry::MultiPolygon(polys) => out.areas += polys.len(),
        OverlayGeometry::GeometryCollection(parts) => {
            for part in parts {
                tally(part, out);
            }
        }
    }
}

impl Layer for OverlayLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
