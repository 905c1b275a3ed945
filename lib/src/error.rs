use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("target size must be at least 3, got {0}")]
    TargetTooSmall(usize),

    #[error("x and y columns differ in length: {x} vs {y}")]
    ShapeMismatch { x: usize, y: usize },

    #[error("invalid target size '{0}': expected an integer or '1/<divisor>'")]
    InvalidTarget(String),

    #[error("invalid antpol '{0}'")]
    InvalidAntPol(String),

    #[error("cannot decode auto buffer of {0} bytes as float32")]
    Decode(usize),

    #[error("{nchans} channels do not evenly divide the {total} channel band")]
    FrequencyAxis { nchans: usize, total: usize },

    #[error("{0}")]
    Validation(String),
}
