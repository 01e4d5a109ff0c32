mod commands;
mod feature;
mod physical_device;
mod pipeline;
pub mod scenes;
mod shader_binding_table;

pub use feature::RayTracingFeature;
pub use physical_device::RayTracingProperties;
pub use pipeline::RayTracingPipeline;
pub use shader_binding_table::{
    RayTracingShaderBindingTables, ShaderBindingTable, ShaderBindingTableLayout, ShaderRecords,
};
