//! GPU error types.

use ash::vk;
use thiserror::Error;

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
