use crate::{
    debug::DebugFeature,
    device::{Device, PhysicalDevice, QueueFamily},
    features::Feature,
    instance::VulkanInstance,
    ray_tracing::RayTracingFeature,
    GpuError, Result,
};
use log::{debug, info};
use std::sync::Arc;

/// A headless Vulkan context with ray tracing enabled.
pub struct Kea {
    device: Arc<Device>,
}

impl Kea {
    pub fn new(validation: bool, mut features: Vec<Box<dyn Feature + '_>>) -> Result<Kea> {
        let mut required_features: Vec<Box<dyn Feature + '_>> =
            vec![Box::new(RayTracingFeature::new())];
        if validation {
            required_features.push(Box::new(DebugFeature::new()));
        }
        required_features.append(&mut features);

        let vulkan = VulkanInstance::new(&required_features)?;
        let (physical_device, queue_family) = ray_tracing_device(&vulkan)?;
        let device = Device::new(physical_device, &[(queue_family, 1)], &required_features)?;

        Ok(Kea { device })
    }

    pub fn physical_device(&self) -> &Arc<PhysicalDevice> {
        self.device.physical_device()
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

fn ray_tracing_device(vulkan: &Arc<VulkanInstance>) -> Result<(Arc<PhysicalDevice>, QueueFamily)> {
    let physical_devices = vulkan.physical_devices()?;
    debug!("All devices: {:?}", physical_devices);

    let (physical_device, queue_family) = physical_devices
        .into_iter()
        .filter(|physical_device| physical_device.supports_ray_tracing())
        .find_map(|physical_device| {
            let queue_family = physical_device
                .queue_families()
                .into_iter()
                .find(|family| family.supports_compute() && family.queue_count() >= 1)?;

            Some((physical_device, queue_family))
        })
        .ok_or_else(|| {
            GpuError::NoSuitableDevice("no device supports KHR ray tracing pipelines".to_string())
        })?;

    info!("Selected device: {:?}", physical_device);

    Ok((physical_device, queue_family))
}
