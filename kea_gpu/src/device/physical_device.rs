use super::queue_family::QueueFamily;
use crate::instance::VulkanInstance;
use ash::{extensions::khr, vk};
use std::{ffi::CStr, fmt, sync::Arc};

pub struct PhysicalDevice {
    vulkan: Arc<VulkanInstance>,
    raw: vk::PhysicalDevice,
    name: String,
}

impl PhysicalDevice {
    pub unsafe fn from_raw(raw: vk::PhysicalDevice, vulkan: Arc<VulkanInstance>) -> PhysicalDevice {
        let props = vulkan.raw().get_physical_device_properties(raw);
        let name = CStr::from_ptr(props.device_name.as_ptr())
            .to_string_lossy()
            .into_owned();

        PhysicalDevice { raw, vulkan, name }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn queue_families(self: &Arc<Self>) -> Vec<QueueFamily> {
        unsafe {
            self.vulkan
                .raw()
                .get_physical_device_queue_family_properties(self.raw)
        }
        .into_iter()
        .enumerate()
        .map(|(index, properties)| QueueFamily::new(index as u32, properties))
        .collect()
    }

    /// Whether every device extension needed by the ray tracing pipeline is present.
    pub fn supports_ray_tracing(&self) -> bool {
        let available = match unsafe {
            self.vulkan
                .raw()
                .enumerate_device_extension_properties(self.raw)
        } {
            Ok(available) => available,
            Err(_) => return false,
        };

        let required = [
            khr::AccelerationStructure::name(),
            khr::DeferredHostOperations::name(),
            khr::RayTracingPipeline::name(),
        ];

        required.iter().all(|name| {
            available
                .iter()
                .any(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) } == *name)
        })
    }

    pub fn max_sampler_anisotropy(&self) -> f32 {
        let props = unsafe {
            self.vulkan
                .raw()
                .get_physical_device_properties(self.raw)
        };
        props.limits.max_sampler_anisotropy
    }

    pub unsafe fn raw(&self) -> vk::PhysicalDevice {
        self.raw
    }

    pub fn vulkan(&self) -> &Arc<VulkanInstance> {
        &self.vulkan
    }
}

impl fmt::Debug for PhysicalDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalDevice({})", self.name)
    }
}
