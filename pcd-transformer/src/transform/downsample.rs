use pcd_core::pointcloud::{decimation::decimator::voxel_downsample, point::PointCloud};

use super::Transform;

pub struct VoxelDownsampleTransform {
    pub voxel_size: f64,
}

impl VoxelDownsampleTransform {
    pub fn new(voxel_size: f64) -> Self {
        Self { voxel_size }
    }
}

impl Transform for VoxelDownsampleTransform {
    fn name(&self) -> &'static str {
        "voxel_downsample"
    }

    fn transform(&self, point_cloud: &PointCloud) -> PointCloud {
        voxel_downsample(point_cloud, self.voxel_size)
    }
}
