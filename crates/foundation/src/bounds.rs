/// Geographic bounding box in WGS84 degrees.
///
/// Longitudes are not wrapped: a box spanning the antimeridian is represented
/// by its raw min/max values.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GeoBounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl GeoBounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    pub fn from_point(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat, lon, lat)
    }

    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    /// Folds an optional running box with a new position.
    pub fn accumulate(acc: Option<GeoBounds>, lon: f64, lat: f64) -> Option<GeoBounds> {
        match acc {
            Some(mut b) => {
                b.extend(lon, lat);
                Some(b)
            }
            None => Some(GeoBounds::from_point(lon, lat)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;

    #[test]
    fn extend_grows_box() {
        let mut b = GeoBounds::from_point(10.0, 20.0);
        b.extend(-5.0, 25.0);
        assert_eq!(b, GeoBounds::new(-5.0, 20.0, 10.0, 25.0));
    }

    #[test]
    fn accumulate_starts_from_first_point() {
        let acc = GeoBounds::accumulate(None, 1.0, 2.0);
        let acc = GeoBounds::accumulate(acc, 3.0, -1.0);
        assert_eq!(acc, Some(GeoBounds::new(1.0, -1.0, 3.0, 2.0)));
    }
}
