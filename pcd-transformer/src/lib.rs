pub mod builder;
pub mod runner;
pub mod transform;

pub use builder::{ConditioningConfig, ConditioningTransformBuilder, TransformBuilder};
pub use runner::{PointCloudTransformer, Transformer};
