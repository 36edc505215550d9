//! GeoJSON overlay documents.
//!
//! Accepts any GeoJSON root object a feed may serve: a `FeatureCollection`,
//! a single `Feature`, or a bare geometry. Everything is normalized into a flat
//! list of [`OverlayFeature`]s so downstream layers only deal with one shape.

use foundation::bounds::GeoBounds;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub lon_deg: f64,
    pub lat_deg: f64,
    pub alt_m: Option<f64>,
}

impl Position {
    pub fn new(lon_deg: f64, lat_deg: f64) -> Self {
        Self {
            lon_deg,
            lat_deg,
            alt_m: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayGeometry {
    Point(Position),
    MultiPoint(Vec<Position>),
    LineString(Vec<Position>),
    MultiLineString(Vec<Vec<Position>>),
    Polygon(Vec<Vec<Position>>),
    MultiPolygon(Vec<Vec<Vec<Position>>>),
    GeometryCollection(Vec<OverlayGeometry>),
}

impl OverlayGeometry {
    /// Visits every position in the geometry, depth first.
    pub fn for_each_position(&self, f: &mut impl FnMut(&Position)) {
        match self {
            OverlayGeometry::Point(p) => f(p),
            OverlayGeometry::MultiPoint(ps) | OverlayGeometry::LineString(ps) => ps.iter().for_each(f),
            OverlayGeometry::MultiLineString(rings) | OverlayGeometry::Polygon(rings) => {
                rings.iter().flatten().for_each(f)
            }
            OverlayGeometry::MultiPolygon(polys) => polys.iter().flatten().flatten().for_each(f),
            OverlayGeometry::GeometryCollection(parts) => {
                for part in parts {
                    part.for_each_position(f);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayFeature {
    pub id: Option<String>,
    pub properties: Map<String, Value>,
    /// `None` for features whose geometry is JSON `null`.
    pub geometry: Option<OverlayGeometry>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayDocument {
    pub features: Vec<OverlayFeature>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayFormatError {
    InvalidJson(String),
    UnsupportedObject(String),
    InvalidFeature { index: usize, reason: String },
}

impl std::fmt::Display for OverlayFormatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayFormatError::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
            OverlayFormatError::UnsupportedObject(ty) => {
                write!(f, "unsupported GeoJSON object: {ty}")
            }
            OverlayFormatError::InvalidFeature { index, reason } => {
                write!(f, "invalid feature at index {index}: {reason}")
            }
        }
    }
}

impl std::error::Error for OverlayFormatError {}

impl OverlayDocument {
    pub fn from_geojson_slice(payload: &[u8]) -> Result<Self, OverlayFormatError> {
        let value: Value = serde_json::from_slice(payload)
            .map_err(|e| OverlayFormatError::InvalidJson(e.to_string()))?;
        Self::from_geojson_value(&value)
    }

    pub fn from_geojson_str(payload: &str) -> Result<Self, OverlayFormatError> {
        Self::from_geojson_slice(payload.as_bytes())
    }

    pub fn from_geojson_value(value: &Value) -> Result<Self, OverlayFormatError> {
        let obj = value
            .as_object()
            .ok_or_else(|| OverlayFormatError::UnsupportedObject("non-object root".to_string()))?;
        let ty = obj
            .get("type")
            .and_then(|v| v.as_str())
            .ok_or_else(|| OverlayFormatError::UnsupportedObject("missing type".to_string()))?;

        match ty {
            "FeatureCollection" => {
                let items = obj.get("features").and_then(|v| v.as_array()).ok_or_else(|| {
                    OverlayFormatError::UnsupportedObject(
                        "FeatureCollection without features array".to_string(),
                    )
                })?;
                let features = items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| {
                        parse_feature(item)
                            .map_err(|reason| OverlayFormatError::InvalidFeature { index, reason })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self { features })
            }
            "Feature" => {
                let feature = parse_feature(value)
                    .map_err(|reason| OverlayFormatError::InvalidFeature { index: 0, reason })?;
                Ok(Self {
                    features: vec![feature],
                })
            }
            _ if is_geometry_type(ty) => {
                let geometry = parse_geometry(value)
                    .map_err(|reason| OverlayFormatError::InvalidFeature { index: 0, reason })?;
                Ok(Self {
                    features: vec![OverlayFeature {
                        id: None,
                        properties: Map::new(),
                        geometry: Some(geometry),
                    }],
                })
            }
            other => Err(OverlayFormatError::UnsupportedObject(other.to_string())),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Bounding box over every position, or `None` when nothing is located.
    pub fn bounds(&self) -> Option<GeoBounds> {
        let mut acc = None;
        for geometry in self.features.iter().filter_map(|f| f.geometry.as_ref()) {
            geometry.for_each_position(&mut |p| {
                acc = GeoBounds::accumulate(acc, p.lon_deg, p.lat_deg);
            });
        }
        acc
    }
}

fn is_geometry_type(ty: &str) -> bool {
    matches!(
        ty,
        "Point"
            | "MultiPoint"
            | "LineString"
            | "MultiLineString"
            | "Polygon"
            | "MultiPolygon"
            | "GeometryCollection"
    )
}

fn parse_feature(value: &Value) -> Result<OverlayFeature, String> {
    let obj = value.as_object().ok_or("feature must be an object")?;
    match obj.get("type").and_then(|v| v.as_str()) {
        Some("Feature") => {}
        Some(other) => return Err(format!("unexpected feature type: {other}")),
        None => return Err("feature missing type".to_string()),
    }

    let id = match obj.get("id") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    let properties = obj
        .get("properties")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();

    let geometry = match obj.get("geometry") {
        None => return Err("feature missing geometry".to_string()),
        Some(Value::Null) => None,
        Some(g) => Some(parse_geometry(g)?),
    };

    Ok(OverlayFeature {
        id,
        properties,
        geometry,
    })
}

fn parse_geometry(value: &Value) -> Result<OverlayGeometry, String> {
    let obj = value.as_object().ok_or("geometry must be an object")?;
    let ty = obj
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or("geometry missing type")?;

    if ty == "GeometryCollection" {
        let parts = obj
            .get("geometries")
            .and_then(|v| v.as_array())
            .ok_or("GeometryCollection missing geometries")?;
        return parts
            .iter()
            .map(parse_geometry)
            .collect::<Result<Vec<_>, _>>()
            .map(OverlayGeometry::GeometryCollection);
    }

    let coords = obj.get("coordinates").ok_or("geometry missing coordinates")?;
    match ty {
        "Point" => parse_position(coords).map(OverlayGeometry::Point),
        "MultiPoint" => parse_positions(coords).map(OverlayGeometry::MultiPoint),
        "LineString" => parse_positions(coords).map(OverlayGeometry::LineString),
        "MultiLineString" => parse_nested(coords, parse_positions).map(OverlayGeometry::MultiLineString),
        "Polygon" => parse_nested(coords, parse_positions).map(OverlayGeometry::Polygon),
        "MultiPolygon" => parse_nested(coords, |poly| parse_nested(poly, parse_positions))
            .map(OverlayGeometry::MultiPolygon),
        other => Err(format!("unsupported geometry type: {other}")),
    }
}

fn parse_position(coords: &Value) -> Result<Position, String> {
    let arr = coords.as_array().ok_or("position must be an array")?;
    if arr.len() < 2 {
        return Err("position must have [lon, lat]".to_string());
    }
    let component = |i: usize, name: &str| -> Result<f64, String> {
        arr[i]
            .as_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("{name} must be a finite number"))
    };

    Ok(Position {
        lon_deg: component(0, "lon")?,
        lat_deg: component(1, "lat")?,
        alt_m: if arr.len() > 2 { Some(component(2, "altitude")?) } else { None },
    })
}

fn parse_positions(coords: &Value) -> Result<Vec<Position>, String> {
    parse_nested(coords, parse_position)
}

fn parse_nested<T>(
    coords: &Value,
    item: impl Fn(&Value) -> Result<T, String>,
) -> Result<Vec<T>, String> {
    coords
        .as_array()
        .ok_or("coordinates must be an array")?
        .iter()
        .map(item)
        .collect()
}
