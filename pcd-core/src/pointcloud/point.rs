use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{PcdError, Result};
use crate::pointcloud::bounds::BoundingVolume;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointAttributes {
    pub intensity: Option<f64>,
    pub classification: Option<String>,
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u16,
    pub g: u16,
    pub b: u16,
}

// Coordinates are millimetres in the shared scan frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub color: Option<Color>,
    pub normal: Option<[f64; 3]>,
    pub attributes: PointAttributes,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Point {
            x,
            y,
            z,
            color: None,
            normal: None,
            attributes: PointAttributes::default(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        (self.x - other.x).powi(2) + (self.y - other.y).powi(2) + (self.z - other.z).powi(2)
    }

    pub fn distance(&self, other: &Point) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Raw point as handed over by the file-parsing side, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub r: Option<u16>,
    #[serde(default)]
    pub g: Option<u16>,
    #[serde(default)]
    pub b: Option<u16>,
    #[serde(default)]
    pub intensity: Option<f64>,
}

impl RawPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        RawPoint {
            x,
            y,
            z,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMeta {
    pub id: String,
    pub source: String,
    pub other: HashMap<String, String>,
}

impl SourceMeta {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        SourceMeta {
            id: id.into(),
            source: source.into(),
            other: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub point_count: usize,
    pub bounding_volume: BoundingVolume,
    /// Points per cubic metre, zero for flat or empty clouds.
    pub density: f64,
    pub source: String,
    pub other: HashMap<String, String>,
}

// A cloud never changes after construction; every processing step derives a
// new one, so index lists taken against a cloud stay valid for that cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    id: String,
    points: Vec<Point>,
    metadata: Metadata,
}

impl PointCloud {
    pub fn new(
        id: impl Into<String>,
        points: Vec<Point>,
        source: impl Into<String>,
        other: HashMap<String, String>,
    ) -> Self {
        let bounding_volume = BoundingVolume::from_positions(points.iter().map(Point::position));
        let point_count = points.len();
        let volume = bounding_volume.volume_m3();
        let density = if volume > 0.0 {
            point_count as f64 / volume
        } else {
            0.0
        };

        let metadata = Metadata {
            point_count,
            bounding_volume,
            density,
            source: source.into(),
            other,
        };

        PointCloud {
            id: id.into(),
            points,
            metadata,
        }
    }

    /// Builds the output of a processing stage; the id records the lineage.
    pub fn derive(&self, stage: &str, points: Vec<Point>) -> PointCloud {
        PointCloud::new(
            format!("{}:{}", self.id, stage),
            points,
            self.metadata.source.clone(),
            self.metadata.other.clone(),
        )
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Id of the ingested cloud this snapshot descends from.
    pub fn root_id(&self) -> &str {
        self.id.split(':').next().unwrap_or(&self.id)
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn bounds(&self) -> &BoundingVolume {
        &self.metadata.bounding_volume
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, f64, f64, &Point)> {
        self.points
            .iter()
            .map(|point| (point.x, point.y, point.z, point))
    }

    pub fn into_points(self) -> Vec<Point> {
        self.points
    }
}

/// Validates raw points and builds the first cloud of a processing chain.
pub fn load_from_array(raw_points: &[RawPoint], source: SourceMeta) -> Result<PointCloud> {
    let mut points = Vec::with_capacity(raw_points.len());

    for (index, raw) in raw_points.iter().enumerate() {
        for (axis, value) in [('x', raw.x), ('y', raw.y), ('z', raw.z)] {
            if !value.is_finite() {
                return Err(PcdError::NonFiniteCoordinate { index, axis, value });
            }
        }
        if let Some(intensity) = raw.intensity {
            if !intensity.is_finite() {
                return Err(PcdError::NonFiniteAttribute {
                    index,
                    name: "intensity",
                    value: intensity,
                });
            }
        }

        let color = match (raw.r, raw.g, raw.b) {
            (None, None, None) => None,
            (r, g, b) => Some(Color {
                r: r.unwrap_or(0),
                g: g.unwrap_or(0),
                b: b.unwrap_or(0),
            }),
        };

        points.push(Point {
            x: raw.x,
            y: raw.y,
            z: raw.z,
            color,
            normal: None,
            attributes: PointAttributes {
                intensity: raw.intensity,
                ..Default::default()
            },
        });
    }

    log::debug!("loaded {} points from {}", points.len(), source.source);

    Ok(PointCloud::new(source.id, points, source.source, source.other))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceMeta {
        SourceMeta::new("scan-1", "lidar")
    }

    #[test]
    fn bounds_and_density_on_load() {
        let raw = vec![
            RawPoint::new(0.0, 0.0, 0.0),
            RawPoint::new(1000.0, 1000.0, 1000.0),
            RawPoint::new(500.0, 250.0, 750.0),
        ];
        let cloud = load_from_array(&raw, source()).unwrap();

        assert_eq!(cloud.id(), "scan-1");
        assert_eq!(cloud.bounds().min, [0.0, 0.0, 0.0]);
        assert_eq!(cloud.bounds().max, [1000.0, 1000.0, 1000.0]);
        assert_eq!(cloud.metadata().density, 3.0);
        assert!(cloud.iter().all(|(x, y, z, _)| cloud.bounds().contains([x, y, z])));
    }

    #[test]
    fn empty_input_gives_zero_bounds() {
        let cloud = load_from_array(&[], source()).unwrap();
        assert!(cloud.is_empty());
        assert_eq!(*cloud.bounds(), BoundingVolume::default());
        assert_eq!(cloud.metadata().density, 0.0);
    }

    #[test]
    fn flat_cloud_has_zero_density() {
        let raw = vec![RawPoint::new(0.0, 0.0, 0.0), RawPoint::new(10.0, 10.0, 0.0)];
        let cloud = load_from_array(&raw, source()).unwrap();
        assert_eq!(cloud.metadata().density, 0.0);
    }

    #[test]
    fn non_finite_coordinate_is_rejected() {
        let raw = vec![RawPoint::new(0.0, 0.0, 0.0), RawPoint::new(1.0, f64::NAN, 0.0)];
        let err = load_from_array(&raw, source()).unwrap_err();
        assert!(matches!(
            err,
            PcdError::NonFiniteCoordinate {
                index: 1,
                axis: 'y',
                ..
            }
        ));

        let raw = vec![RawPoint::new(f64::INFINITY, 0.0, 0.0)];
        assert!(load_from_array(&raw, source()).is_err());
    }

    #[test]
    fn colors_are_kept_when_present() {
        let raw = vec![RawPoint {
            r: Some(255),
            g: Some(128),
            ..RawPoint::new(1.0, 2.0, 3.0)
        }];
        let cloud = load_from_array(&raw, source()).unwrap();
        assert_eq!(
            cloud.points()[0].color,
            Some(Color {
                r: 255,
                g: 128,
                b: 0
            })
        );
    }

    #[test]
    fn raw_points_read_from_json_with_optional_fields() {
        let raw: Vec<RawPoint> = serde_json::from_str(
            r#"[{"x": 1, "y": 2.5, "z": -3}, {"x": 0, "y": 0, "z": 0, "r": 255, "intensity": 0.4}]"#,
        )
        .unwrap();

        assert_eq!(raw[0], RawPoint::new(1.0, 2.5, -3.0));
        assert_eq!(raw[1].r, Some(255));
        assert_eq!(raw[1].g, None);
        assert_eq!(raw[1].intensity, Some(0.4));

        let cloud = load_from_array(&raw, source()).unwrap();
        assert_eq!(cloud.bounds().min, [0.0, 0.0, -3.0]);
    }

    #[test]
    fn derive_keeps_provenance_and_recomputes_bounds() {
        let raw = vec![RawPoint::new(0.0, 0.0, 0.0), RawPoint::new(10.0, 10.0, 10.0)];
        let cloud = load_from_array(&raw, source()).unwrap();
        let derived = cloud.derive("voxel", vec![Point::new(5.0, 5.0, 5.0)]);

        assert_eq!(derived.id(), "scan-1:voxel");
        assert_eq!(derived.root_id(), "scan-1");
        assert_eq!(derived.metadata().source, "lidar");
        assert_eq!(derived.bounds().min, [5.0, 5.0, 5.0]);
        assert_eq!(cloud.len(), 2);
    }
}
