use super::{DescriptorSet, DescriptorSetLayout};
use crate::{device::Device, Result};
use ash::vk;
use std::sync::Arc;

pub struct DescriptorPool {
    device: Arc<Device>,
    raw: vk::DescriptorPool,
}

impl DescriptorPool {
    pub fn new(
        device: Arc<Device>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> Result<Arc<DescriptorPool>> {
        let create_info = vk::DescriptorPoolCreateInfo::builder()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);
        let raw = unsafe { device.raw().create_descriptor_pool(&create_info, None) }?;

        Ok(Arc::new(DescriptorPool { device, raw }))
    }

    pub fn allocate_descriptor_sets(
        self: &Arc<Self>,
        layouts: &[&DescriptorSetLayout],
    ) -> Result<Vec<DescriptorSet>> {
        let raw_layouts: Vec<vk::DescriptorSetLayout> = layouts
            .iter()
            .map(|layout| unsafe { layout.raw() })
            .collect();
        let allocate_info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.raw)
            .set_layouts(&raw_layouts);

        let descriptor_sets = unsafe { self.device.raw().allocate_descriptor_sets(&allocate_info) }?;

        Ok(descriptor_sets
            .into_iter()
            .map(|raw| unsafe { DescriptorSet::new(self.clone(), raw) })
            .collect())
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_descriptor_pool(self.raw, None);
        }
    }
}
