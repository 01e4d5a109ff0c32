mod config;
mod extensions;
mod vulkan_instance;

pub use config::InstanceConfig;
pub use extensions::{Ext, InstanceExtensions};
pub use vulkan_instance::VulkanInstance;
