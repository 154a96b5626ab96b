pub mod attachment;
pub mod clearance;
pub mod config;
pub mod connection;
pub mod constraints;
pub mod image;
pub mod merge;
pub mod model;
pub mod modeler;

pub use config::{AttachmentConfig, ClearanceConfig, FusionConfig, ModelerConfig};
pub use connection::{
    find_connection_opportunities, AccessMethod, AccessSuggestion, ConnectionConfig,
    ConnectionOpportunity,
};
pub use constraints::{extract_constraints, ConstraintType, EngineeringConstraint};
pub use image::{
    DetectedOpening, ImageAnalysis, ImageAnalyzer, ImageInput, NoopImageAnalyzer, Opening2d,
    OpeningType, PixelBox, StaticImageAnalyzer,
};
pub use model::{
    AttachmentMethod, AttachmentPoint, AttachmentType, ClearancePriority, ClearanceZone,
    EnvironmentModel, ProcessingMetadata, SourceKind, SourceRecord, ZoneType,
};
pub use modeler::{CloudDetections, EnvironmentModeler, ModelInput};
