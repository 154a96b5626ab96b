use std::collections::{HashSet, VecDeque};
use std::fmt;

use pcd_core::pointcloud::{
    bounds::BoundingVolume,
    neighbors::{Boundary, SpatialGrid},
    point::PointCloud,
};
use serde::{Deserialize, Serialize};

use crate::{snapshot::CloudIndices, surface::DetectedSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObstacleType {
    Column,
    Pipe,
    Duct,
    Equipment,
    Beam,
    Unknown,
}

impl fmt::Display for ObstacleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObstacleType::Column => "column",
            ObstacleType::Pipe => "pipe",
            ObstacleType::Duct => "duct",
            ObstacleType::Equipment => "equipment",
            ObstacleType::Beam => "beam",
            ObstacleType::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObstacle {
    pub id: String,
    pub obstacle_type: ObstacleType,
    pub bounds: BoundingVolume,
    pub centroid: [f64; 3],
    /// Extent along x, mm.
    pub width: f64,
    /// Extent along y, mm.
    pub depth: f64,
    /// Extent along z, mm.
    pub height: f64,
    pub source: CloudIndices,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    /// Fewer leftover points than this and no clustering is attempted.
    pub min_candidates: usize,
    /// Single-link distance between cluster members, mm.
    pub cluster_radius: f64,
    pub min_cluster_size: usize,
    /// Heuristic confidence given to every classified cluster.
    pub confidence: f64,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            min_candidates: 10,
            cluster_radius: 200.0,
            min_cluster_size: 5,
            confidence: 0.6,
        }
    }
}

/// Shape heuristic on cluster extents (mm). Rows are tried in order.
pub fn classify_obstacle(width: f64, depth: f64, height: f64) -> ObstacleType {
    let round_footprint = (width - depth).abs() < 100.0;
    let elongated_low =
        height > 200.0 && height < 800.0 && (width > 2.0 * height || depth > 2.0 * height);

    if round_footprint && height > 500.0 && width < 300.0 {
        ObstacleType::Pipe
    } else if round_footprint && height > 500.0 && height > width.max(depth) {
        ObstacleType::Column
    } else if elongated_low && width.min(depth) < 200.0 {
        ObstacleType::Beam
    } else if elongated_low {
        ObstacleType::Duct
    } else if width > 500.0 && depth > 500.0 && height > 500.0 {
        ObstacleType::Equipment
    } else {
        ObstacleType::Unknown
    }
}

/// Clusters the points no surface claimed and classifies each cluster.
pub fn detect_obstacles(
    cloud: &PointCloud,
    surfaces: &[DetectedSurface],
    config: &ObstacleConfig,
) -> Vec<DetectedObstacle> {
    let points = cloud.points();
    let claimed: HashSet<usize> = surfaces
        .iter()
        .filter_map(|surface| surface.indices_for(cloud))
        .flatten()
        .copied()
        .collect();
    let candidates: Vec<usize> = (0..points.len()).filter(|i| !claimed.contains(i)).collect();

    if candidates.len() < config.min_candidates {
        return Vec::new();
    }

    let grid = SpatialGrid::new(
        candidates.iter().map(|&i| (i, points[i].position())),
        config.cluster_radius,
    );

    let mut visited: HashSet<usize> = HashSet::new();
    let mut obstacles = Vec::new();

    for &seed in &candidates {
        if !visited.insert(seed) {
            continue;
        }

        let mut cluster = Vec::new();
        let mut queue = VecDeque::from([seed]);
        while let Some(current) = queue.pop_front() {
            cluster.push(current);
            let neighbors = grid.within(
                points[current].position(),
                config.cluster_radius,
                Boundary::Inclusive,
            );
            for neighbor in neighbors {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        if cluster.len() < config.min_cluster_size {
            continue;
        }
        cluster.sort_unstable();

        let bounds = BoundingVolume::from_positions(cluster.iter().map(|&i| points[i].position()));
        let n = cluster.len() as f64;
        let mut centroid = [0.0; 3];
        for &i in &cluster {
            centroid[0] += points[i].x / n;
            centroid[1] += points[i].y / n;
            centroid[2] += points[i].z / n;
        }
        let [width, depth, height] = bounds.dimensions();

        obstacles.push(DetectedObstacle {
            id: format!("obstacle:{}:{}", cloud.root_id(), obstacles.len()),
            obstacle_type: classify_obstacle(width, depth, height),
            bounds,
            centroid,
            width,
            depth,
            height,
            source: CloudIndices::new(cloud, cluster),
            confidence: config.confidence,
        });
    }

    log::debug!(
        "obstacles in {}: {} clusters from {} candidates",
        cloud.id(),
        obstacles.len(),
        candidates.len()
    );

    obstacles
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use approx::assert_relative_eq;
    use pcd_core::pointcloud::point::Point;

    use super::*;
    use crate::{plane::Plane, surface::SurfaceType};

    fn block(origin: [f64; 3], size: [f64; 3], spacing: f64) -> Vec<Point> {
        let steps = |extent: f64| (extent / spacing).round() as usize;
        let mut points = Vec::new();
        for i in 0..=steps(size[0]) {
            for j in 0..=steps(size[1]) {
                for k in 0..=steps(size[2]) {
                    points.push(Point::new(
                        origin[0] + (i as f64 * spacing).min(size[0]),
                        origin[1] + (j as f64 * spacing).min(size[1]),
                        origin[2] + (k as f64 * spacing).min(size[2]),
                    ));
                }
            }
        }
        points
    }

    fn cloud(points: Vec<Point>) -> PointCloud {
        PointCloud::new("room", points, "unit", HashMap::new())
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(classify_obstacle(250.0, 250.0, 800.0), ObstacleType::Pipe);
        assert_eq!(classify_obstacle(400.0, 400.0, 800.0), ObstacleType::Column);
        assert_eq!(classify_obstacle(600.0, 600.0, 600.0), ObstacleType::Equipment);
        assert_eq!(classify_obstacle(1000.0, 150.0, 300.0), ObstacleType::Beam);
        assert_eq!(classify_obstacle(1000.0, 400.0, 300.0), ObstacleType::Duct);
        assert_eq!(classify_obstacle(100.0, 300.0, 100.0), ObstacleType::Unknown);
    }

    #[test]
    fn separates_and_classifies_clusters() {
        let mut points = block([0.0, 0.0, 0.0], [400.0, 400.0, 800.0], 100.0);
        points.extend(block([3000.0, 3000.0, 0.0], [1000.0, 150.0, 300.0], 50.0));
        let obstacles = detect_obstacles(&cloud(points), &[], &ObstacleConfig::default());

        assert_eq!(obstacles.len(), 2);
        assert_eq!(obstacles[0].obstacle_type, ObstacleType::Column);
        assert_relative_eq!(obstacles[0].centroid[0], 200.0, epsilon = 1e-6);
        assert_relative_eq!(obstacles[0].centroid[2], 400.0, epsilon = 1e-6);
        assert_eq!(obstacles[0].height, 800.0);
        assert_eq!(obstacles[1].obstacle_type, ObstacleType::Beam);
        assert!(obstacles.iter().all(|o| o.confidence == 0.6));
    }

    #[test]
    fn surface_points_are_not_candidates() {
        let points = block([0.0, 0.0, 0.0], [400.0, 400.0, 800.0], 100.0);
        let input = cloud(points);
        let everything = DetectedSurface {
            id: "s".to_string(),
            surface_type: SurfaceType::Irregular,
            plane: Plane {
                normal: [0.0, 0.0, 1.0],
                d: 0.0,
            },
            bounds: *input.bounds(),
            area: 0.0,
            sources: vec![CloudIndices::new(&input, (0..input.len()).collect())],
            confidence: 1.0,
        };
        assert!(detect_obstacles(&input, &[everything], &ObstacleConfig::default()).is_empty());
    }

    #[test]
    fn sparse_leftovers_yield_nothing() {
        let points = (0..9).map(|i| Point::new(i as f64 * 10.0, 0.0, 0.0)).collect();
        assert!(detect_obstacles(&cloud(points), &[], &ObstacleConfig::default()).is_empty());

        // Ten isolated points: enough candidates, but every cluster is a singleton.
        let points = (0..10).map(|i| Point::new(i as f64 * 1000.0, 0.0, 0.0)).collect();
        assert!(detect_obstacles(&cloud(points), &[], &ObstacleConfig::default()).is_empty());
    }
}
