mod library;
mod manifest;
mod shader_groups;
mod shader_module;

pub use library::{ShaderLibrary, ShaderSource};
pub use manifest::{EntryPointManifest, ParameterKind, ParameterManifest, ShaderManifest, ShaderStage};
pub use shader_groups::{PipelineShaders, ShaderGroup, ShaderGroupKind, ShaderGroups};
pub use shader_module::{ShaderEntryPoint, ShaderModule};
