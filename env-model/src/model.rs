use std::fmt;

use pcd_core::pointcloud::bounds::BoundingVolume;
use pcd_detector::{DetectedEdge, DetectedObstacle, DetectedSurface, ObstacleType, SurfaceType};
use serde::{Deserialize, Serialize};

use crate::image::{DetectedOpening, OpeningType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentType {
    FloorAnchor,
    WallMount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentMethod {
    ExpansionAnchor,
    ChemicalAnchor,
    ThroughBolt,
    Clamp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentPoint {
    pub id: String,
    pub position: [f64; 3],
    pub normal: [f64; 3],
    /// Id of the owning surface; look it up with [`EnvironmentModel::surface`].
    pub surface_id: String,
    pub attachment_type: AttachmentType,
    pub load_capacity_kn: f64,
    pub methods: Vec<AttachmentMethod>,
    /// Free width, depth and height (mm) needed around the point.
    pub clearance: [f64; 3],
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    Egress,
    Access,
    Equipment,
    Safety,
    Maintenance,
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ZoneType::Egress => "egress",
            ZoneType::Access => "access",
            ZoneType::Equipment => "equipment",
            ZoneType::Safety => "safety",
            ZoneType::Maintenance => "maintenance",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearancePriority {
    Required,
    Preferred,
    Optional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceZone {
    pub id: String,
    pub zone_type: ZoneType,
    pub bounds: BoundingVolume,
    pub priority: ClearancePriority,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    PointCloud,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub id: String,
    pub kind: SourceKind,
    /// Where the data came from, e.g. the scanner name or the file.
    pub origin: String,
    /// Points for clouds, openings for images.
    pub item_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    pub point_count: usize,
    pub image_count: usize,
    pub duration_ms: u64,
    /// Mean confidence over all surfaces and obstacles, 0 when there are none.
    pub confidence: f64,
}

/// The fused, read-only description of a scanned environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentModel {
    pub bounds: BoundingVolume,
    pub surfaces: Vec<DetectedSurface>,
    pub obstacles: Vec<DetectedObstacle>,
    pub openings: Vec<DetectedOpening>,
    pub edges: Vec<DetectedEdge>,
    pub attachment_points: Vec<AttachmentPoint>,
    pub clearance_zones: Vec<ClearanceZone>,
    pub sources: Vec<SourceRecord>,
    pub metadata: ProcessingMetadata,
}

impl EnvironmentModel {
    pub fn surface(&self, id: &str) -> Option<&DetectedSurface> {
        self.surfaces.iter().find(|surface| surface.id == id)
    }

    pub fn surfaces_of_type(
        &self,
        surface_type: SurfaceType,
    ) -> impl Iterator<Item = &DetectedSurface> {
        self.surfaces
            .iter()
            .filter(move |surface| surface.surface_type == surface_type)
    }

    pub fn obstacles_of_type(
        &self,
        obstacle_type: ObstacleType,
    ) -> impl Iterator<Item = &DetectedObstacle> {
        self.obstacles
            .iter()
            .filter(move |obstacle| obstacle.obstacle_type == obstacle_type)
    }

    pub fn doors(&self) -> impl Iterator<Item = &DetectedOpening> {
        self.openings
            .iter()
            .filter(|opening| opening.opening_type == OpeningType::Door)
    }

    /// The surface an attachment point is mounted on.
    pub fn attachment_surface(&self, point: &AttachmentPoint) -> Option<&DetectedSurface> {
        self.surface(&point.surface_id)
    }
}
