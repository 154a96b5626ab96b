pub mod edge;
pub mod obstacle;
pub mod plane;
pub mod snapshot;
pub mod surface;

pub use edge::{detect_edges, DetectedEdge, EdgeConfig, EdgeType};
pub use obstacle::{
    classify_obstacle, detect_obstacles, DetectedObstacle, ObstacleConfig, ObstacleType,
};
pub use plane::Plane;
pub use snapshot::CloudIndices;
pub use surface::{
    detect_ground_plane, detect_walls, DetectedSurface, GroundPlaneConfig, SurfaceConfig,
    SurfaceDetector, SurfaceType, WallConfig,
};
