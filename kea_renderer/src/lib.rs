pub mod backend;
pub mod config;
mod error;
pub mod launch;
pub mod passes;
pub mod pipeline;
pub mod program;
pub mod recording;
pub mod registry;
pub mod scenes;
pub mod variables;
pub mod vulkan;

pub use error::{CompileError, RenderError, Result};
