use serde::{Deserialize, Serialize};

use crate::geo::{CoordError, LngLat, parse_lng_lat};

/// Axis-aligned geographic bounds (south-west / north-east corners).
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[LngLat; 2]", into = "[LngLat; 2]")]
pub struct LngLatBounds {
    pub sw: LngLat,
    pub ne: LngLat,
}

impl LngLatBounds {
    pub fn new(sw: LngLat, ne: LngLat) -> Self {
        Self { sw, ne }
    }

    /// Smallest bounds containing every point, or `None` for an empty input.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a LngLat>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = *it.next()?;
        let mut out = Self::new(first, first);
        for p in it {
            out.sw.lng = out.sw.lng.min(p.lng);
            out.sw.lat = out.sw.lat.min(p.lat);
            out.ne.lng = out.ne.lng.max(p.lng);
            out.ne.lat = out.ne.lat.max(p.lat);
        }
        Some(out)
    }

    /// Midpoint of the longitude span and the latitude span.
    pub fn center(&self) -> LngLat {
        LngLat::new(
            (self.sw.lng + self.ne.lng) * 0.5,
            (self.sw.lat + self.ne.lat) * 0.5,
        )
    }
}

impl From<[LngLat; 2]> for LngLatBounds {
    fn from(v: [LngLat; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<LngLatBounds> for [LngLat; 2] {
    fn from(v: LngLatBounds) -> Self {
        [v.sw, v.ne]
    }
}

/// Four image corners, in the order the catalog stores them
/// (top-left, top-right, bottom-right, bottom-left).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Quad {
    pub corners: [LngLat; 4],
}

impl Quad {
    pub fn new(corners: [LngLat; 4]) -> Self {
        Self { corners }
    }

    /// Parses four `"lng,lat"` strings. Fails on the first malformed corner.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Result<Self, CoordError> {
        if raw.len() != 4 {
            return Err(CoordError::CornerCount(raw.len()));
        }
        let mut corners = [LngLat::new(0.0, 0.0); 4];
        for (slot, s) in corners.iter_mut().zip(raw) {
            *slot = parse_lng_lat(s.as_ref())?;
        }
        Ok(Self { corners })
    }

    pub fn bounds(&self) -> LngLatBounds {
        let c = &self.corners;
        let mut out = LngLatBounds::new(c[0], c[0]);
        for p in &c[1..] {
            out.sw.lng = out.sw.lng.min(p.lng);
            out.sw.lat = out.sw.lat.min(p.lat);
            out.ne.lng = out.ne.lng.max(p.lng);
            out.ne.lat = out.ne.lat.max(p.lat);
        }
        out
    }

    /// Fly-to fallback when a map carries no explicit center.
    pub fn center(&self) -> LngLat {
        self.bounds().center()
    }

    pub fn to_arrays(&self) -> [[f64; 2]; 4] {
        self.corners.map(LngLat::to_array)
    }
}
