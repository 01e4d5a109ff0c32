pub mod commands;
pub mod debug;
pub mod descriptors;
pub mod device;
mod error;
pub mod features;
pub mod instance;
mod kea;
pub mod pipelines;
pub mod queues;
pub mod ray_tracing;
pub mod shaders;
pub mod storage;
pub mod sync;

pub use error::{GpuError, Result};
pub use kea::Kea;
