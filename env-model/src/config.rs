use pcd_core::pointcloud::bounds::BoundingVolume;
use pcd_detector::{EdgeConfig, ObstacleConfig, SurfaceConfig};
use pcd_transformer::ConditioningConfig;
use serde::{Deserialize, Serialize};

/// Cross-source merging and image projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    /// Same-type surfaces merge when their XY overlap exceeds this share of
    /// the first surface's footprint.
    pub surface_overlap_ratio: f64,
    /// Obstacles whose centroids are closer than this (mm) are duplicates.
    pub obstacle_merge_distance: f64,
    /// Millimetres per image pixel. A placeholder until cameras are calibrated.
    pub pixel_scale: f64,
    pub opening_confidence_scale: f64,
    /// Model bounds when nothing was detected.
    pub default_bounds: BoundingVolume,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            surface_overlap_ratio: 0.5,
            obstacle_merge_distance: 500.0,
            pixel_scale: 2.0,
            opening_confidence_scale: 0.8,
            default_bounds: BoundingVolume::new([0.0, 0.0, 0.0], [10000.0, 10000.0, 5000.0]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttachmentConfig {
    pub floor_spacing: f64,
    pub floor_capacity_kn: f64,
    pub floor_confidence_scale: f64,
    /// Free space (width, depth, height in mm) kept around a floor anchor.
    pub floor_envelope: [f64; 3],
    pub wall_horizontal_spacing: f64,
    pub wall_vertical_spacing: f64,
    /// The lowest wall row sits this far above the wall base.
    pub wall_base_offset: f64,
    pub wall_capacity_kn: f64,
    pub wall_confidence_scale: f64,
    pub wall_envelope: [f64; 3],
}

impl Default for AttachmentConfig {
    fn default() -> Self {
        Self {
            floor_spacing: 1000.0,
            floor_capacity_kn: 50.0,
            floor_confidence_scale: 0.9,
            floor_envelope: [500.0, 500.0, 500.0],
            wall_horizontal_spacing: 1000.0,
            wall_vertical_spacing: 500.0,
            wall_base_offset: 500.0,
            wall_capacity_kn: 10.0,
            wall_confidence_scale: 0.8,
            wall_envelope: [300.0, 300.0, 300.0],
        }
    }
}

impl AttachmentConfig {
    pub fn with_floor_spacing(mut self, spacing: f64) -> Self {
        self.floor_spacing = spacing;
        self
    }

    pub fn with_wall_spacing(mut self, horizontal: f64, vertical: f64) -> Self {
        self.wall_horizontal_spacing = horizontal;
        self.wall_vertical_spacing = vertical;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClearanceConfig {
    /// Added on each side of a door, mm.
    pub egress_side_margin: f64,
    /// Total depth of the egress zone across the door plane, mm.
    pub egress_depth: f64,
    pub equipment_lateral_margin: f64,
    pub equipment_vertical_margin: f64,
}

impl Default for ClearanceConfig {
    fn default() -> Self {
        Self {
            egress_side_margin: 500.0,
            egress_depth: 2000.0,
            equipment_lateral_margin: 750.0,
            equipment_vertical_margin: 500.0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelerConfig {
    pub conditioning: ConditioningConfig,
    pub surfaces: SurfaceConfig,
    pub obstacles: ObstacleConfig,
    pub edges: EdgeConfig,
    pub fusion: FusionConfig,
    pub attachment: AttachmentConfig,
    pub clearance: ClearanceConfig,
}

impl ModelerConfig {
    pub fn with_conditioning(mut self, conditioning: ConditioningConfig) -> Self {
        self.conditioning = conditioning;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.surfaces.seed = seed;
        self
    }
}
