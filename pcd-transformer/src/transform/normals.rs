use pcd_core::pointcloud::{
    normal::estimator::{estimate_normals, NormalParams},
    point::PointCloud,
};

use super::Transform;

pub struct NormalEstimationTransform {
    pub params: NormalParams,
}

impl NormalEstimationTransform {
    pub fn new(params: NormalParams) -> Self {
        Self { params }
    }
}

impl Transform for NormalEstimationTransform {
    fn name(&self) -> &'static str {
        "normal_estimation"
    }

    fn transform(&self, point_cloud: &PointCloud) -> PointCloud {
        estimate_normals(point_cloud, &self.params)
    }
}
