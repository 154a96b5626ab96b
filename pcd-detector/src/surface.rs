//! RANSAC surface detection.
//!
//! One ground plane is fitted against the whole cloud, then vertical wall
//! planes are peeled off the remaining points round by round. All sampling
//! goes through the caller's generator, so a fixed seed reproduces the
//! output exactly.

use std::collections::HashSet;
use std::fmt;

use pcd_core::pointcloud::{
    bounds::BoundingVolume,
    point::{Point, PointCloud},
};
use rand::{rngs::StdRng, seq::index, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::{plane::Plane, snapshot::CloudIndices};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceType {
    Floor,
    Wall,
    Ceiling,
    Ramp,
    Stairs,
    Irregular,
}

impl fmt::Display for SurfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceType::Floor => "floor",
            SurfaceType::Wall => "wall",
            SurfaceType::Ceiling => "ceiling",
            SurfaceType::Ramp => "ramp",
            SurfaceType::Stairs => "stairs",
            SurfaceType::Irregular => "irregular",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedSurface {
    pub id: String,
    pub surface_type: SurfaceType,
    pub plane: Plane,
    pub bounds: BoundingVolume,
    /// mm²
    pub area: f64,
    /// Inliers per source snapshot. Detection yields one entry; fusion may
    /// append entries from other clouds.
    pub sources: Vec<CloudIndices>,
    pub confidence: f64,
}

impl DetectedSurface {
    pub fn inlier_count(&self) -> usize {
        self.sources.iter().map(CloudIndices::len).sum()
    }

    pub fn indices_for(&self, cloud: &PointCloud) -> Option<&[usize]> {
        self.sources
            .iter()
            .find(|source| source.belongs_to(cloud))
            .map(|source| source.indices.as_slice())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundPlaneConfig {
    /// Clouds smaller than this are not searched.
    pub min_points: usize,
    pub iterations: usize,
    /// Point-to-plane distance (mm) for inliers.
    pub inlier_threshold: f64,
    /// Minimum |c| of the unit normal.
    pub min_vertical_component: f64,
    pub min_inliers: usize,
}

impl Default for GroundPlaneConfig {
    fn default() -> Self {
        Self {
            min_points: 100,
            iterations: 100,
            inlier_threshold: 50.0,
            min_vertical_component: 0.8,
            min_inliers: 50,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallConfig {
    /// Minimum wall area in mm², measured on the inlier bounding box.
    pub min_area: f64,
    pub max_rounds: usize,
    pub iterations: usize,
    pub inlier_threshold: f64,
    /// Maximum |c| of the unit normal.
    pub max_vertical_component: f64,
    pub min_inliers: usize,
    /// Extraction stops once fewer points than this remain.
    pub min_pool: usize,
}

impl Default for WallConfig {
    fn default() -> Self {
        Self {
            min_area: 500_000.0,
            max_rounds: 10,
            iterations: 50,
            inlier_threshold: 50.0,
            max_vertical_component: 0.3,
            min_inliers: 30,
            min_pool: 100,
        }
    }
}

impl WallConfig {
    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    pub ground: GroundPlaneConfig,
    pub walls: WallConfig,
    pub seed: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            ground: GroundPlaneConfig::default(),
            walls: WallConfig::default(),
            seed: 42,
        }
    }
}

impl SurfaceConfig {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

pub struct SurfaceDetector {
    pub config: SurfaceConfig,
}

impl SurfaceDetector {
    pub fn new(config: SurfaceConfig) -> Self {
        Self { config }
    }

    /// Ground plane (if any) followed by the accepted walls.
    pub fn detect<R: Rng + ?Sized>(&self, cloud: &PointCloud, rng: &mut R) -> Vec<DetectedSurface> {
        let ground = detect_ground_plane(cloud, &self.config.ground, rng);
        let walls = detect_walls(cloud, ground.as_ref(), &self.config.walls, rng);

        log::debug!(
            "surfaces in {}: ground {}, walls {}",
            cloud.id(),
            ground.is_some(),
            walls.len()
        );

        ground.into_iter().chain(walls).collect()
    }

    /// Like [`SurfaceDetector::detect`], drawing from a generator seeded with
    /// `config.seed`.
    pub fn detect_seeded(&self, cloud: &PointCloud) -> Vec<DetectedSurface> {
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        self.detect(cloud, &mut rng)
    }
}

struct RansacSettings {
    iterations: usize,
    inlier_threshold: f64,
}

fn fit_plane<R, F>(
    points: &[Point],
    pool: &[usize],
    settings: &RansacSettings,
    accept: F,
    rng: &mut R,
) -> Option<(Plane, Vec<usize>)>
where
    R: Rng + ?Sized,
    F: Fn(&Plane) -> bool,
{
    if pool.len() < 3 {
        return None;
    }

    let mut best: Option<(Plane, Vec<usize>)> = None;

    for _ in 0..settings.iterations {
        let sample = index::sample(rng, pool.len(), 3);
        let Some(candidate) = Plane::from_points(
            &points[pool[sample.index(0)]],
            &points[pool[sample.index(1)]],
            &points[pool[sample.index(2)]],
        ) else {
            continue;
        };
        if !accept(&candidate) {
            continue;
        }

        let inliers: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&i| candidate.distance(&points[i]) <= settings.inlier_threshold)
            .collect();

        let improves = best
            .as_ref()
            .map_or(true, |(_, best_inliers)| inliers.len() > best_inliers.len());
        if improves {
            best = Some((candidate, inliers));
        }
    }

    best
}

fn inlier_bounds(points: &[Point], inliers: &[usize]) -> BoundingVolume {
    BoundingVolume::from_positions(inliers.iter().map(|&i| points[i].position()))
}

// Longer horizontal side of the inlier box times its height. A slice cut
// diagonally through a compact object stays bounded by its footprint.
fn wall_area(bounds: &BoundingVolume) -> f64 {
    let [dx, dy, dz] = bounds.dimensions();
    dx.max(dy) * dz
}

pub fn detect_ground_plane<R: Rng + ?Sized>(
    cloud: &PointCloud,
    config: &GroundPlaneConfig,
    rng: &mut R,
) -> Option<DetectedSurface> {
    let points = cloud.points();
    if points.len() < config.min_points {
        return None;
    }

    let pool: Vec<usize> = (0..points.len()).collect();
    let settings = RansacSettings {
        iterations: config.iterations,
        inlier_threshold: config.inlier_threshold,
    };
    let (plane, inliers) = fit_plane(
        points,
        &pool,
        &settings,
        |plane| plane.vertical_component() >= config.min_vertical_component,
        rng,
    )?;

    if inliers.len() < config.min_inliers {
        log::debug!(
            "no ground in {}: best plane has {} inliers",
            cloud.id(),
            inliers.len()
        );
        return None;
    }

    let bounds = inlier_bounds(points, &inliers);
    let confidence = inliers.len() as f64 / points.len() as f64;

    Some(DetectedSurface {
        id: format!("surface:{}:floor", cloud.root_id()),
        surface_type: SurfaceType::Floor,
        plane: plane.facing_up(),
        bounds,
        area: bounds.xy_area(),
        sources: vec![CloudIndices::new(cloud, inliers)],
        confidence,
    })
}

/// Peels vertical planes off the points left over by `ground`.
///
/// A round's inliers leave the pool even when the plane is rejected for
/// being too small, which bounds the work at `max_rounds`.
pub fn detect_walls<R: Rng + ?Sized>(
    cloud: &PointCloud,
    ground: Option<&DetectedSurface>,
    config: &WallConfig,
    rng: &mut R,
) -> Vec<DetectedSurface> {
    let points = cloud.points();
    let ground_inliers: HashSet<usize> = ground
        .and_then(|surface| surface.indices_for(cloud))
        .map(|indices| indices.iter().copied().collect())
        .unwrap_or_default();

    let mut pool: Vec<usize> = (0..points.len())
        .filter(|i| !ground_inliers.contains(i))
        .collect();
    let settings = RansacSettings {
        iterations: config.iterations,
        inlier_threshold: config.inlier_threshold,
    };

    let mut walls = Vec::new();
    for round in 0..config.max_rounds {
        if pool.len() < config.min_pool {
            break;
        }

        let Some((plane, inliers)) = fit_plane(
            points,
            &pool,
            &settings,
            |plane| plane.vertical_component() <= config.max_vertical_component,
            rng,
        ) else {
            break;
        };
        if inliers.len() < config.min_inliers {
            break;
        }

        let pool_size = pool.len();
        let consumed: HashSet<usize> = inliers.iter().copied().collect();
        pool.retain(|i| !consumed.contains(i));

        let bounds = inlier_bounds(points, &inliers);
        let area = wall_area(&bounds);
        if area < config.min_area {
            log::debug!(
                "round {} in {}: plane with {} inliers rejected, area {:.0} mm²",
                round,
                cloud.id(),
                inliers.len(),
                area
            );
            continue;
        }

        walls.push(DetectedSurface {
            id: format!("surface:{}:wall-{}", cloud.root_id(), walls.len()),
            surface_type: SurfaceType::Wall,
            plane,
            bounds,
            area,
            confidence: inliers.len() as f64 / pool_size as f64,
            sources: vec![CloudIndices::new(cloud, inliers)],
        });
    }

    walls
}
