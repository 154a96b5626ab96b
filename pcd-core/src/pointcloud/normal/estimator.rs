use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pointcloud::{
    neighbors::{Boundary, SpatialGrid},
    point::{Point, PointCloud},
};

pub const DEFAULT_NORMAL: [f64; 3] = [0.0, 0.0, 1.0];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalParams {
    /// Neighbourhood radius in mm; neighbours must lie strictly inside it.
    pub radius: f64,
    pub min_neighbors: usize,
}

impl Default for NormalParams {
    fn default() -> Self {
        Self {
            radius: 100.0,
            min_neighbors: 3,
        }
    }
}

impl NormalParams {
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Covariance {
    xx: f64,
    yy: f64,
    zz: f64,
    xy: f64,
}

fn covariance(points: &[Point], neighbors: &[usize]) -> Covariance {
    let n = neighbors.len() as f64;
    let mut centroid = [0.0; 3];
    for &i in neighbors {
        centroid[0] += points[i].x;
        centroid[1] += points[i].y;
        centroid[2] += points[i].z;
    }
    centroid.iter_mut().for_each(|c| *c /= n);

    let mut cov = Covariance::default();
    for &i in neighbors {
        let dx = points[i].x - centroid[0];
        let dy = points[i].y - centroid[1];
        let dz = points[i].z - centroid[2];
        cov.xx += dx * dx;
        cov.yy += dy * dy;
        cov.zz += dz * dz;
        cov.xy += dx * dy;
    }
    cov.xx /= n;
    cov.yy /= n;
    cov.zz /= n;
    cov.xy /= n;
    cov
}

// Horizontal patches spread least along z and get the up vector. Anything
// else is treated as vertical: the normal is perpendicular to the dominant
// horizontal direction of the patch.
fn normal_from_covariance(cov: &Covariance) -> [f64; 3] {
    if cov.zz < cov.xx.min(cov.yy) {
        return DEFAULT_NORMAL;
    }
    let theta = 0.5 * (2.0 * cov.xy).atan2(cov.xx - cov.yy);
    [-theta.sin(), theta.cos(), 0.0]
}

/// Returns a copy of the cloud with a normal on every point.
pub fn estimate_normals(cloud: &PointCloud, params: &NormalParams) -> PointCloud {
    let points = cloud.points();
    let grid = SpatialGrid::from_points(points, params.radius);

    let normals: Vec<[f64; 3]> = points
        .par_iter()
        .enumerate()
        .map(|(i, point)| {
            let neighbors: Vec<usize> = grid
                .within(point.position(), params.radius, Boundary::Exclusive)
                .into_iter()
                .filter(|&j| j != i)
                .collect();
            if neighbors.len() < params.min_neighbors {
                return DEFAULT_NORMAL;
            }
            normal_from_covariance(&covariance(points, &neighbors))
        })
        .collect();

    let with_normals = points
        .iter()
        .zip(normals)
        .map(|(point, normal)| Point {
            normal: Some(normal),
            ..point.clone()
        })
        .collect();

    cloud.derive("normals", with_normals)
}
