mod device;
mod extensions;
mod initialization;
mod physical_device;
mod queue_family;

pub use device::Device;
pub use extensions::{DeviceExtensions, Ext};
pub use initialization::DeviceConfig;
pub use physical_device::PhysicalDevice;
pub use queue_family::{QueueCapability, QueueFamily};
