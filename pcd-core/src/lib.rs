pub mod error;
pub mod pointcloud;

pub use error::{PcdError, Result};
pub use pointcloud::{
    bounds::BoundingVolume,
    point::{
        load_from_array, Color, Metadata, Point, PointAttributes, PointCloud, RawPoint, SourceMeta,
    },
};
