//! Statistical outlier removal.
//!
//! Every point gets the mean distance to its `k` nearest neighbours. Points
//! whose value reaches `mean + std_ratio * std_dev` of the whole cloud are
//! dropped. Statistics come from the unfiltered cloud in a single pass.

use serde::{Deserialize, Serialize};

use crate::pointcloud::{neighbors::mean_knn_distances, point::PointCloud};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierParams {
    pub k_neighbors: usize,
    pub std_ratio: f64,
}

impl Default for OutlierParams {
    fn default() -> Self {
        Self {
            k_neighbors: 20,
            std_ratio: 2.0,
        }
    }
}

impl OutlierParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    pub fn with_std_ratio(mut self, ratio: f64) -> Self {
        self.std_ratio = ratio;
        self
    }
}

#[derive(Debug, Clone)]
pub struct OutlierReport {
    pub cloud: PointCloud,
    pub original_count: usize,
    pub outliers_removed: usize,
    /// `None` when the cloud was too small to be evaluated.
    pub threshold: Option<f64>,
}

impl std::fmt::Display for OutlierReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "outlier removal: {} -> {} points ({} removed)",
            self.original_count,
            self.cloud.len(),
            self.outliers_removed
        )
    }
}

pub fn remove_outliers(cloud: &PointCloud, params: &OutlierParams) -> PointCloud {
    remove_outliers_with_report(cloud, params).cloud
}

pub fn remove_outliers_with_report(cloud: &PointCloud, params: &OutlierParams) -> OutlierReport {
    let original_count = cloud.len();
    let unchanged = |threshold| OutlierReport {
        cloud: cloud.derive("outliers", cloud.points().to_vec()),
        original_count,
        outliers_removed: 0,
        threshold,
    };

    if original_count < params.k_neighbors || params.k_neighbors == 0 {
        return unchanged(None);
    }

    let mean_distances = mean_knn_distances(cloud.points(), params.k_neighbors);
    let n = mean_distances.len() as f64;
    let mean = mean_distances.iter().sum::<f64>() / n;
    let variance = mean_distances
        .iter()
        .map(|d| (d - mean).powi(2))
        .sum::<f64>()
        / n;
    let std_dev = variance.sqrt();

    // Uniform spacing: no point stands out.
    if std_dev <= 1e-9 * mean.abs().max(1.0) {
        return unchanged(Some(mean));
    }

    let threshold = mean + params.std_ratio * std_dev;
    let points: Vec<_> = cloud
        .points()
        .iter()
        .zip(&mean_distances)
        .filter(|(_, &distance)| distance < threshold)
        .map(|(point, _)| point.clone())
        .collect();

    let outliers_removed = original_count - points.len();
    log::debug!(
        "outlier filter {}: threshold {:.1} mm, removed {}",
        cloud.id(),
        threshold,
        outliers_removed
    );

    OutlierReport {
        cloud: cloud.derive("outliers", points),
        original_count,
        outliers_removed,
        threshold: Some(threshold),
    }
}
