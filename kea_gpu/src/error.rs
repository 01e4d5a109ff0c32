use ash::vk;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpuError {
    #[error("failed to load the Vulkan library: {0}")]
    Loading(#[from] ash::LoadingError),

    #[error("Vulkan call failed: {0}")]
    Vulkan(#[from] vk::Result),

    #[error("GPU memory allocation failed: {0}")]
    Allocation(#[from] gpu_allocator::AllocationError),

    #[error("no suitable device: {0}")]
    NoSuitableDevice(String),

    #[error("device extension {0} was not enabled")]
    MissingExtension(&'static str),

    #[error("ray tracing pipeline creation failed: {0}")]
    PipelineCreation(String),

    #[error("{0} has not been built")]
    NotBuilt(String),

    #[error("memory backing {0} is not host visible")]
    NotHostVisible(String),

    #[error("shader library `{source_id}`: {reason}")]
    ShaderLibrary { source_id: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed shader manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GpuError>;
