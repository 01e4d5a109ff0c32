use crate::{
    device::{self, DeviceConfig},
    instance::{self, InstanceConfig},
};

/// An optional piece of Vulkan functionality. Features contribute instance
/// extensions, layers and device extensions, and may tweak the configuration
/// of the instance and device before they are created.
pub trait Feature {
    fn instance_extensions(&self) -> Vec<instance::Ext> {
        vec![]
    }

    fn layers(&self) -> Vec<String> {
        vec![]
    }

    fn device_extensions(&self) -> Vec<device::Ext> {
        vec![]
    }

    fn configure_device(&self, _config: &mut DeviceConfig) {}

    fn configure_instance(&self, _config: &mut InstanceConfig) {}
}
