use super::{Ext, PhysicalDevice, QueueFamily};
use crate::{features::Feature, Result};
use ash::vk;
use log::info;
use std::{iter, os::raw::c_char};

#[derive(Default, Debug)]
pub struct DeviceConfig {
    pub ray_tracing: bool,
    pub sampler_anisotropy: bool,
}

pub fn create_device(
    physical_device: &PhysicalDevice,
    queues: &[(QueueFamily, usize)],
    features: &[Box<dyn Feature + '_>],
) -> Result<(ash::Device, Vec<Ext>)> {
    // Priorities vec needs to exist on the stack to prevent the optimiser deleting
    // it before we use it (.build() throws away lifetimes)
    let queues_with_priorities: Vec<(u32, Vec<f32>)> = queues
        .iter()
        .map(|(family, count)| {
            let priorities = iter::repeat(1.0).take(*count).collect();
            (family.index(), priorities)
        })
        .collect();

    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = queues_with_priorities
        .iter()
        .map(|(family_index, priorities)| {
            vk::DeviceQueueCreateInfo::builder()
                .queue_family_index(*family_index)
                .queue_priorities(priorities)
                .build()
        })
        .collect();

    let mut device_config = DeviceConfig::default();

    let mut extensions: Vec<Ext> = vec![];
    for feature in features {
        extensions.extend(feature.device_extensions());
        feature.configure_device(&mut device_config);
    }

    info!("Device configuration: {:?}", device_config);

    let extension_names: Vec<*const c_char> = extensions.iter().map(|ext| ext.name()).collect();
    info!("Requested device extensions: {:?}", extensions);

    let core_features =
        vk::PhysicalDeviceFeatures::builder().sampler_anisotropy(device_config.sampler_anisotropy);
    let mut features_12 = vk::PhysicalDeviceVulkan12Features::builder()
        .buffer_device_address(true)
        .vulkan_memory_model(true);
    let mut features_rt = vk::PhysicalDeviceRayTracingPipelineFeaturesKHR::builder()
        .ray_tracing_pipeline(device_config.ray_tracing);
    let mut features_as = vk::PhysicalDeviceAccelerationStructureFeaturesKHR::builder()
        .acceleration_structure(device_config.ray_tracing);

    let mut create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .enabled_features(&core_features)
        .push_next(&mut features_12);
    if device_config.ray_tracing {
        create_info = create_info
            .push_next(&mut features_rt)
            .push_next(&mut features_as);
    }

    let device = unsafe {
        physical_device
            .vulkan()
            .raw()
            .create_device(physical_device.raw(), &create_info, None)
    }?;

    Ok((device, extensions))
}
