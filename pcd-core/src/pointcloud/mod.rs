pub mod bounds;
pub mod decimation;
pub mod filter;
pub mod neighbors;
pub mod normal;
pub mod point;
