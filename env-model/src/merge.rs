//! Deduplication of detections coming from different sources.

use pcd_detector::{DetectedObstacle, DetectedSurface};

/// Merges same-type surfaces whose footprints overlap.
///
/// A single pass in input order: each surface absorbs at most one later
/// partner, so chains of three or more overlapping surfaces may stay split.
/// The survivor keeps the first surface's id and plane.
pub fn merge_surfaces(surfaces: Vec<DetectedSurface>, overlap_ratio: f64) -> Vec<DetectedSurface> {
    let total = surfaces.len();
    let mut consumed = vec![false; total];
    let mut merged = Vec::with_capacity(total);

    for i in 0..total {
        if consumed[i] {
            continue;
        }
        consumed[i] = true;
        let mut current = surfaces[i].clone();
        let footprint = current.bounds.xy_area();

        let partner = (i + 1..total).find(|&j| {
            !consumed[j]
                && surfaces[j].surface_type == current.surface_type
                && current.bounds.xy_overlap_area(&surfaces[j].bounds) > overlap_ratio * footprint
        });

        if let Some(j) = partner {
            consumed[j] = true;
            let other = &surfaces[j];
            current.bounds = current.bounds.union(&other.bounds);
            current.confidence = current.confidence.max(other.confidence);
            current.area = current.area.max(other.area);
            current.sources.extend(other.sources.iter().cloned());
            log::debug!("merged surface {} into {}", other.id, current.id);
        }

        merged.push(current);
    }

    merged
}

/// Drops obstacles whose centroid lies within `distance` of one already kept.
pub fn dedupe_obstacles(obstacles: Vec<DetectedObstacle>, distance: f64) -> Vec<DetectedObstacle> {
    let mut kept: Vec<DetectedObstacle> = Vec::with_capacity(obstacles.len());
    for obstacle in obstacles {
        let duplicate = kept
            .iter()
            .any(|existing| centroid_distance(existing, &obstacle) < distance);
        if duplicate {
            log::debug!("dropped duplicate obstacle {}", obstacle.id);
        } else {
            kept.push(obstacle);
        }
    }
    kept
}

fn centroid_distance(a: &DetectedObstacle, b: &DetectedObstacle) -> f64 {
    (0..3)
        .map(|axis| (a.centroid[axis] - b.centroid[axis]).powi(2))
        .sum::<f64>()
        .sqrt()
}
