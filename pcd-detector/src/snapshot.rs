use pcd_core::pointcloud::point::{Point, PointCloud};
use serde::{Deserialize, Serialize};

/// Point indices bound to the cloud snapshot they were computed against.
///
/// Resolving against any other snapshot yields `None` instead of silently
/// reading unrelated points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloudIndices {
    pub cloud_id: String,
    pub indices: Vec<usize>,
}

impl CloudIndices {
    pub fn new(cloud: &PointCloud, indices: Vec<usize>) -> Self {
        Self {
            cloud_id: cloud.id().to_string(),
            indices,
        }
    }

    pub fn belongs_to(&self, cloud: &PointCloud) -> bool {
        self.cloud_id == cloud.id()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn resolve<'a>(&self, cloud: &'a PointCloud) -> Option<Vec<&'a Point>> {
        if !self.belongs_to(cloud) {
            return None;
        }
        self.indices
            .iter()
            .map(|&i| cloud.points().get(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn resolves_only_against_its_own_snapshot() {
        let cloud = PointCloud::new(
            "scan",
            vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 2.0, 3.0)],
            "unit",
            HashMap::new(),
        );
        let derived = cloud.derive("voxel", cloud.points().to_vec());
        let handle = CloudIndices::new(&cloud, vec![1]);

        let resolved = handle.resolve(&cloud).unwrap();
        assert_eq!(resolved[0].position(), [1.0, 2.0, 3.0]);
        assert!(handle.resolve(&derived).is_none());
    }

    #[test]
    fn out_of_range_index_does_not_resolve() {
        let cloud = PointCloud::new("scan", vec![Point::new(0.0, 0.0, 0.0)], "unit", HashMap::new());
        assert!(CloudIndices::new(&cloud, vec![3]).resolve(&cloud).is_none());
    }
}
