use pcd_core::pointcloud::point::PointCloud;

pub mod downsample;
pub mod normals;
pub mod outlier;

pub use downsample::VoxelDownsampleTransform;
pub use normals::NormalEstimationTransform;
pub use outlier::OutlierRemovalTransform;

/// One conditioning stage. Stages never touch their input; each returns a
/// freshly derived cloud.
pub trait Transform: Send + Sync {
    fn name(&self) -> &'static str;

    fn transform(&self, point_cloud: &PointCloud) -> PointCloud;

    /// Leaf stages in the order they run.
    fn stage_names(&self) -> Vec<&'static str> {
        vec![self.name()]
    }
}

pub struct CompositeTransform {
    transforms: Vec<Box<dyn Transform>>,
}

impl CompositeTransform {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }
}

impl Transform for CompositeTransform {
    fn name(&self) -> &'static str {
        "composite"
    }

    fn stage_names(&self) -> Vec<&'static str> {
        self.transforms
            .iter()
            .flat_map(|transform| transform.stage_names())
            .collect()
    }

    fn transform(&self, point_cloud: &PointCloud) -> PointCloud {
        let mut intermediate = point_cloud.clone();

        for transform in &self.transforms {
            let start = std::time::Instant::now();
            let next = transform.transform(&intermediate);
            log::debug!(
                "{} on {}: {} -> {} points in {:?}",
                transform.name(),
                intermediate.id(),
                intermediate.len(),
                next.len(),
                start.elapsed()
            );
            intermediate = next;
        }

        intermediate
    }
}
