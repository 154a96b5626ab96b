use pcd_core::pointcloud::point::PointCloud;

use crate::{builder::TransformBuilder, transform::Transform};

pub trait Transformer {
    fn execute(&self, point_cloud: &PointCloud) -> PointCloud;
}

pub struct PointCloudTransformer {
    transform: Box<dyn Transform>,
}

impl PointCloudTransformer {
    pub fn new(transform: Box<dyn Transform>) -> Self {
        Self { transform }
    }

    pub fn from_builder(builder: &dyn TransformBuilder) -> Self {
        Self::new(builder.build())
    }
}

impl Transformer for PointCloudTransformer {
    fn execute(&self, point_cloud: &PointCloud) -> PointCloud {
        let start = std::time::Instant::now();
        let conditioned = self.transform.transform(point_cloud);
        log::info!(
            "conditioned {}: {} -> {} points in {:?}",
            point_cloud.id(),
            point_cloud.len(),
            conditioned.len(),
            start.elapsed()
        );
        conditioned
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pcd_core::pointcloud::point::Point;

    use super::*;
    use crate::builder::{ConditioningConfig, ConditioningTransformBuilder};

    fn floor_patch() -> PointCloud {
        let points = (0..30)
            .flat_map(|i| (0..30).map(move |j| Point::new(i as f64 * 30.0, j as f64 * 30.0, 0.0)))
            .chain(std::iter::once(Point::new(450.0, 450.0, 8000.0)))
            .collect();
        PointCloud::new("patch", points, "unit", HashMap::new())
    }

    #[test]
    fn pipeline_runs_every_stage_and_leaves_input_alone() {
        let input = floor_patch();
        let builder = ConditioningTransformBuilder::new(ConditioningConfig::default());
        let output = PointCloudTransformer::from_builder(&builder).execute(&input);

        assert_eq!(input.len(), 901);
        assert_eq!(output.id(), "patch:voxel:outliers:normals");
        assert!(output.points().iter().all(|p| p.z == 0.0));
        assert!(output.points().iter().all(|p| p.normal == Some([0.0, 0.0, 1.0])));
    }

    #[test]
    fn passthrough_config_keeps_points() {
        let input = floor_patch();
        let builder = ConditioningTransformBuilder::new(ConditioningConfig::passthrough());
        let output = PointCloudTransformer::from_builder(&builder).execute(&input);
        assert_eq!(output.points(), input.points());
    }
}
