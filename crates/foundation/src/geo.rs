use serde::{Deserialize, Serialize};

/// Geographic position in degrees, longitude first (the tile-map convention).
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub const fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(&self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(v: [f64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(v: LngLat) -> Self {
        v.to_array()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordError {
    /// Input did not contain exactly two comma-separated components.
    Shape(String),
    /// A component was not a finite number.
    NotANumber(String),
    /// Longitude or latitude outside the valid degree range.
    OutOfRange(String),
    /// A quad did not have exactly four corners.
    CornerCount(usize),
}

impl std::fmt::Display for CoordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoordError::Shape(raw) => write!(f, "expected \"lng,lat\", got {raw:?}"),
            CoordError::NotANumber(raw) => write!(f, "coordinate is not a finite number: {raw:?}"),
            CoordError::OutOfRange(raw) => write!(f, "coordinate out of range: {raw:?}"),
            CoordError::CornerCount(n) => write!(f, "expected 4 corners, got {n}"),
        }
    }
}

impl std::error::Error for CoordError {}

/// Parses a `"lng,lat"` pair as stored by the map catalog.
///
/// Whitespace around either component is tolerated; anything else is rejected
/// instead of being coerced to NaN.
pub fn parse_lng_lat(raw: &str) -> Result<LngLat, CoordError> {
    let mut parts = raw.split(',');
    let (Some(lng), Some(lat), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CoordError::Shape(raw.to_string()));
    };

    let lng = parse_component(lng, raw)?;
    let lat = parse_component(lat, raw)?;
    if !(-180.0..=180.0).contains(&lng) || !(-90.0..=90.0).contains(&lat) {
        return Err(CoordError::OutOfRange(raw.to_string()));
    }
    Ok(LngLat::new(lng, lat))
}

fn parse_component(part: &str, raw: &str) -> Result<f64, CoordError> {
    let v = part
        .trim()
        .parse::<f64>()
        .map_err(|_| CoordError::NotANumber(raw.to_string()))?;
    if !v.is_finite() {
        return Err(CoordError::NotANumber(raw.to_string()));
    }
    Ok(v)
}
