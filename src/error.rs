//! Error types for volumetric audio.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VolumetricError {
    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type Result<T> = std::result::Result<T, VolumetricError>;
