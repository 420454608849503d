use foundation::{OverlayKey, Quad};

use crate::descriptor::{OverlayBuildError, RasterImage};
use crate::layer::{LayerId, SourceId};
use crate::surface::{LayerKind, LayerSpec, SourceSpec};

/// Source and layer for one georeferenced image.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOverlay {
    pub source_id: SourceId,
    pub source: SourceSpec,
    pub layer: LayerSpec,
}

impl RasterOverlay {
    pub fn build(
        key: &OverlayKey,
        image: &RasterImage,
        opacity: f64,
    ) -> Result<Self, OverlayBuildError> {
        if image.url.trim().is_empty() {
            return Err(OverlayBuildError::MissingImage);
        }
        let quad = Quad::parse(image.corners.as_slice())?;

        let source_id = SourceId::for_overlay(key);
        Ok(Self {
            source: SourceSpec::Image {
                url: image.url.clone(),
                coordinates: quad.to_arrays(),
            },
            layer: LayerSpec {
                id: LayerId::for_overlay(key),
                source: source_id.clone(),
                kind: LayerKind::Raster,
                opacity,
            },
            source_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RasterOverlay;
    use crate::descriptor::{OverlayBuildError, RasterImage};
    use crate::surface::{LayerKind, SourceSpec};
    use foundation::{CoordError, OverlayId, OverlayKey, OverlayKind};

    fn key() -> OverlayKey {
        OverlayKey::new(OverlayKind::Raster, OverlayId::new("sf1853"))
    }

    fn image(corners: &[&str]) -> RasterImage {
        RasterImage {
            url: "https://example.org/sf1853.png".to_string(),
            corners: corners.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn builds_image_source_with_parsed_corners() {
        let img = image(&["-122.1,37.1", "-122.0,37.1", "-122.0,37.0", "-122.1,37.0"]);
        let r = RasterOverlay::build(&key(), &img, 0.4).expect("build");
        assert_eq!(r.source_id.as_str(), "raster-source-sf1853");
        assert_eq!(r.layer.id.as_str(), "raster-layer-sf1853");
        assert_eq!(r.layer.source, r.source_id);
        assert_eq!(r.layer.kind, LayerKind::Raster);
        assert_eq!(r.layer.opacity, 0.4);
        let SourceSpec::Image { coordinates, .. } = r.source else {
            panic!("expected image source");
        };
        assert_eq!(coordinates[2], [-122.0, 37.0]);
    }

    #[test]
    fn rejects_missing_corner_and_missing_url() {
        let three = image(&["0,0", "1,0", "1,1"]);
        assert_eq!(
            RasterOverlay::build(&key(), &three, 1.0),
            Err(OverlayBuildError::Coords(CoordError::CornerCount(3)))
        );

        let mut no_url = image(&["0,0", "1,0", "1,1", "0,1"]);
        no_url.url = "  ".to_string();
        assert_eq!(
            RasterOverlay::build(&key(), &no_url, 1.0),
            Err(OverlayBuildError::MissingImage)
        );
    }
}
