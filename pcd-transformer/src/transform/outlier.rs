use pcd_core::pointcloud::{
    filter::outlier::{remove_outliers_with_report, OutlierParams},
    point::PointCloud,
};

use super::Transform;

pub struct OutlierRemovalTransform {
    pub params: OutlierParams,
}

impl OutlierRemovalTransform {
    pub fn new(params: OutlierParams) -> Self {
        Self { params }
    }
}

impl Transform for OutlierRemovalTransform {
    fn name(&self) -> &'static str {
        "outlier_removal"
    }

    fn transform(&self, point_cloud: &PointCloud) -> PointCloud {
        let report = remove_outliers_with_report(point_cloud, &self.params);
        log::debug!("{}: {}", point_cloud.id(), report);
        report.cloud
    }
}
