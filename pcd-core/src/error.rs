use thiserror::Error;

pub type Result<T> = std::result::Result<T, PcdError>;

#[derive(Debug, Error, PartialEq)]
pub enum PcdError {
    #[error("point {index}: coordinate {axis} is not finite ({value})")]
    NonFiniteCoordinate {
        index: usize,
        axis: char,
        value: f64,
    },

    #[error("point {index}: attribute '{name}' is not finite ({value})")]
    NonFiniteAttribute {
        index: usize,
        name: &'static str,
        value: f64,
    },
}
