use super::{extensions::DeviceExtensions, physical_device::PhysicalDevice, QueueFamily};
use crate::{features::Feature, instance::VulkanInstance, queues::Queue, GpuError, Result};
use ash::vk;
use gpu_allocator::{
    vulkan::{Allocator, AllocatorCreateDesc},
    AllocatorDebugSettings,
};
use parking_lot::Mutex;
use std::{mem::ManuallyDrop, sync::Arc};

struct QueueHandle {
    raw: vk::Queue,
    family: QueueFamily,
}

pub struct Device {
    physical_device: Arc<PhysicalDevice>,
    raw: ash::Device,
    ext: DeviceExtensions,
    allocator: ManuallyDrop<Mutex<Allocator>>,
    queues: Vec<QueueHandle>,
}

impl Device {
    pub fn new(
        physical_device: Arc<PhysicalDevice>,
        queues: &[(QueueFamily, usize)],
        features: &[Box<dyn Feature + '_>],
    ) -> Result<Arc<Device>> {
        let (raw, extensions) =
            super::initialization::create_device(&physical_device, queues, features)?;
        let instance = physical_device.vulkan();
        let ext = DeviceExtensions::new(&raw, unsafe { instance.raw() }, &extensions);

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: unsafe { instance.raw() }.clone(),
            device: raw.clone(),
            physical_device: unsafe { physical_device.raw() },
            debug_settings: AllocatorDebugSettings {
                log_memory_information: true,
                log_leaks_on_shutdown: true,
                ..Default::default()
            },
            buffer_device_address: true,
        });
        let allocator = match allocator {
            Ok(allocator) => allocator,
            Err(err) => {
                unsafe { raw.destroy_device(None) };
                return Err(err.into());
            }
        };

        let queues = queues
            .iter()
            .flat_map(|(family, count)| {
                (0..*count).map(|index| QueueHandle {
                    raw: unsafe { raw.get_device_queue(family.index(), index as u32) },
                    family: family.clone(),
                })
            })
            .collect();

        Ok(Arc::new(Device {
            physical_device,
            raw,
            ext,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            queues,
        }))
    }

    pub fn physical_device(&self) -> &Arc<PhysicalDevice> {
        &self.physical_device
    }

    pub fn allocator(&self) -> &Mutex<Allocator> {
        &self.allocator
    }

    pub fn wait_until_idle(&self) -> Result<()> {
        unsafe { self.raw.device_wait_idle() }?;
        Ok(())
    }

    pub unsafe fn raw(&self) -> &ash::Device {
        &self.raw
    }

    pub fn ext(&self) -> &DeviceExtensions {
        &self.ext
    }

    pub fn instance(&self) -> &VulkanInstance {
        self.physical_device.vulkan()
    }

    /// The first queue able to record compute work, which on every ray tracing
    /// capable device also accepts `vkCmdTraceRaysKHR`.
    pub fn compute_queue(self: &Arc<Self>) -> Result<Queue> {
        let handle = self
            .queues
            .iter()
            .find(|handle| handle.family.supports_compute())
            .ok_or_else(|| GpuError::NoSuitableDevice("no compute queue was created".into()))?;

        Ok(unsafe { Queue::new_from_raw(self.clone(), handle.raw, handle.family.clone()) })
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(err) = self.raw.device_wait_idle() {
                log::error!("device_wait_idle failed during shutdown: {:?}", err);
            }

            // We need to use manually drop here to ensure the allocator
            // cleans up any remaining memory before the device is destroyed
            ManuallyDrop::drop(&mut self.allocator);
            self.raw.destroy_device(None);
        }
    }
}
