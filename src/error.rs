use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A layer, model or builder configuration was rejected before training.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// A dataset, sample or call argument was rejected.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// A vector length does not match the model's input or output width.
    #[error("invalid shape: {0}")]
    InvalidShape(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors raised while validating a configuration.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::InvalidConfig(_))
    }

    /// True for errors raised while validating data handed to the engine.
    pub fn is_data(&self) -> bool {
        matches!(self, Error::InvalidData(_) | Error::InvalidShape(_))
    }
}
