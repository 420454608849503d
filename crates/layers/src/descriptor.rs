use foundation::{
    CoordError, LngLat, LngLatBounds, OverlayId, OverlayKey, OverlayKind, Quad, parse_lng_lat,
};

/// Georeferenced image: URL plus four `"lng,lat"` corner strings.
///
/// Corners stay unparsed until materialization so malformed catalog data
/// surfaces as a skipped overlay rather than a failed load.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub url: String,
    pub corners: Vec<String>,
}

/// One pin of a vector overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    /// `"lng,lat"`.
    pub coordinates: String,
    /// Degrees clockwise from north.
    pub bearing: f64,
    pub caption: String,
    pub image: String,
    pub directional: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverlayGeometry {
    Raster(RasterImage),
    Vector(Vec<VectorPoint>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayDescriptor {
    pub id: OverlayId,
    pub geometry: OverlayGeometry,
    /// Always within `[0, 1]`; see [`clamp_opacity`].
    pub opacity: f64,
    /// Explicit fly-to target, when the catalog provides one.
    pub center: Option<LngLat>,
}

impl OverlayDescriptor {
    pub fn raster(id: impl Into<OverlayId>, url: impl Into<String>, corners: Vec<String>) -> Self {
        Self {
            id: id.into(),
            geometry: OverlayGeometry::Raster(RasterImage {
                url: url.into(),
                corners,
            }),
            opacity: 1.0,
            center: None,
        }
    }

    pub fn vector(id: impl Into<OverlayId>, points: Vec<VectorPoint>) -> Self {
        Self {
            id: id.into(),
            geometry: OverlayGeometry::Vector(points),
            opacity: 1.0,
            center: None,
        }
    }

    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.opacity = clamp_opacity(opacity);
        self
    }

    pub fn with_center(mut self, center: LngLat) -> Self {
        self.center = Some(center);
        self
    }

    pub fn kind(&self) -> OverlayKind {
        match self.geometry {
            OverlayGeometry::Raster(_) => OverlayKind::Raster,
            OverlayGeometry::Vector(_) => OverlayKind::Vector,
        }
    }

    pub fn key(&self) -> OverlayKey {
        OverlayKey::new(self.kind(), self.id.clone())
    }

    /// Where "fly to this map" should go.
    ///
    /// Explicit center first; otherwise the bounding midpoint of the raster
    /// quad or of the parseable vector points.
    pub fn focus_point(&self) -> Option<LngLat> {
        if let Some(c) = self.center {
            return Some(c);
        }
        match &self.geometry {
            OverlayGeometry::Raster(img) => Quad::parse(img.corners.as_slice())
                .ok()
                .map(|q| q.center()),
            OverlayGeometry::Vector(points) => {
                let parsed: Vec<LngLat> = points
                    .iter()
                    .filter_map(|p| parse_lng_lat(&p.coordinates).ok())
                    .collect();
                LngLatBounds::from_points(&parsed).map(|b| b.center())
            }
        }
    }
}

/// Why a descriptor could not be turned into a source and layer.
#[derive(Debug, Clone, PartialEq)]
pub enum OverlayBuildError {
    Coords(CoordError),
    /// Pin `index` has malformed coordinates.
    Point { index: usize, source: CoordError },
    MissingImage,
    NoPoints,
}

impl std::fmt::Display for OverlayBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverlayBuildError::Coords(e) => write!(f, "bad image corners: {e}"),
            OverlayBuildError::Point { index, source } => write!(f, "bad pin {index}: {source}"),
            OverlayBuildError::MissingImage => write!(f, "raster overlay has no image url"),
            OverlayBuildError::NoPoints => write!(f, "vector overlay has no points"),
        }
    }
}

impl std::error::Error for OverlayBuildError {}

impl From<CoordError> for OverlayBuildError {
    fn from(e: CoordError) -> Self {
        OverlayBuildError::Coords(e)
    }
}

/// Clamps to `[0, 1]`; NaN is treated as fully opaque.
pub fn clamp_opacity(v: f64) -> f64 {
    if v.is_nan() { 1.0 } else { v.clamp(0.0, 1.0) }
}
