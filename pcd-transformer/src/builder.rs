use pcd_core::pointcloud::{filter::outlier::OutlierParams, normal::estimator::NormalParams};
use serde::{Deserialize, Serialize};

use crate::transform::{
    CompositeTransform, NormalEstimationTransform, OutlierRemovalTransform, Transform,
    VoxelDownsampleTransform,
};

pub trait TransformBuilder {
    fn build(&self) -> Box<dyn Transform>;
}

/// Conditioning stages applied to every cloud before detection. A `None`
/// stage is skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConditioningConfig {
    pub voxel_size: Option<f64>,
    pub outlier: Option<OutlierParams>,
    pub normals: Option<NormalParams>,
}

impl Default for ConditioningConfig {
    fn default() -> Self {
        Self {
            voxel_size: Some(50.0),
            outlier: Some(OutlierParams::default()),
            normals: Some(NormalParams::default()),
        }
    }
}

impl ConditioningConfig {
    pub fn passthrough() -> Self {
        Self {
            voxel_size: None,
            outlier: None,
            normals: None,
        }
    }

    pub fn with_voxel_size(mut self, voxel_size: Option<f64>) -> Self {
        self.voxel_size = voxel_size;
        self
    }

    pub fn with_outlier(mut self, outlier: Option<OutlierParams>) -> Self {
        self.outlier = outlier;
        self
    }

    pub fn with_normals(mut self, normals: Option<NormalParams>) -> Self {
        self.normals = normals;
        self
    }
}

pub struct ConditioningTransformBuilder {
    config: ConditioningConfig,
}

impl ConditioningTransformBuilder {
    pub fn new(config: ConditioningConfig) -> Self {
        Self { config }
    }
}

impl TransformBuilder for ConditioningTransformBuilder {
    fn build(&self) -> Box<dyn Transform> {
        let mut stages: Vec<Box<dyn Transform>> = Vec::new();

        if let Some(voxel_size) = self.config.voxel_size {
            stages.push(Box::new(VoxelDownsampleTransform::new(voxel_size)));
        }
        if let Some(params) = &self.config.outlier {
            stages.push(Box::new(OutlierRemovalTransform::new(params.clone())));
        }
        if let Some(params) = &self.config.normals {
            stages.push(Box::new(NormalEstimationTransform::new(params.clone())));
        }

        Box::new(CompositeTransform::new(stages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_three_stages() {
        let builder = ConditioningTransformBuilder::new(ConditioningConfig::default());
        assert_eq!(
            builder.build().stage_names(),
            vec!["voxel_downsample", "outlier_removal", "normal_estimation"]
        );
    }

    #[test]
    fn disabled_stages_are_left_out() {
        let config = ConditioningConfig::default()
            .with_voxel_size(None)
            .with_normals(None);
        let builder = ConditioningTransformBuilder::new(config);
        assert_eq!(builder.build().stage_names(), vec!["outlier_removal"]);

        let builder = ConditioningTransformBuilder::new(ConditioningConfig::passthrough());
        assert!(builder.build().stage_names().is_empty());
    }

    #[test]
    fn config_fields_fall_back_to_defaults() {
        let config: ConditioningConfig = serde_json::from_str(r#"{"voxel_size": null}"#).unwrap();
        assert_eq!(config.voxel_size, None);
        assert_eq!(config.outlier, Some(OutlierParams::default()));
    }
}
