use super::DescriptorPool;
use crate::{
    device::Device,
    ray_tracing::scenes::AccelerationStructure,
    storage::images::{ImageView, Sampler},
};
use ash::vk;
use std::{slice, sync::Arc};

pub struct DescriptorSet {
    pool: Arc<DescriptorPool>,
    raw: vk::DescriptorSet,
}

impl DescriptorSet {
    pub unsafe fn new(pool: Arc<DescriptorPool>, raw: vk::DescriptorSet) -> Self {
        Self { pool, raw }
    }

    pub fn write_storage_image(&self, binding: u32, image: &ImageView) {
        self.write_image(binding, vk::DescriptorType::STORAGE_IMAGE, image)
    }

    pub fn write_sampled_image(&self, binding: u32, image: &ImageView) {
        self.write_image(binding, vk::DescriptorType::SAMPLED_IMAGE, image)
    }

    fn write_image(&self, binding: u32, descriptor_type: vk::DescriptorType, image: &ImageView) {
        let image_info = vk::DescriptorImageInfo::builder()
            .image_view(unsafe { image.raw() })
            .image_layout(vk::ImageLayout::GENERAL)
            .build();

        let write_set = vk::WriteDescriptorSet::builder()
            .descriptor_type(descriptor_type)
            .dst_set(self.raw)
            .dst_binding(binding)
            .image_info(slice::from_ref(&image_info))
            .build();

        unsafe {
            self.device()
                .raw()
                .update_descriptor_sets(slice::from_ref(&write_set), &[])
        };
    }

    pub fn write_sampler(&self, binding: u32, sampler: &Sampler) {
        let image_info = vk::DescriptorImageInfo::builder()
            .sampler(unsafe { sampler.raw() })
            .build();

        let write_set = vk::WriteDescriptorSet::builder()
            .descriptor_type(vk::DescriptorType::SAMPLER)
            .dst_set(self.raw)
            .dst_binding(binding)
            .image_info(slice::from_ref(&image_info))
            .build();

        unsafe {
            self.device()
                .raw()
                .update_descriptor_sets(slice::from_ref(&write_set), &[])
        };
    }

    pub fn write_acceleration_structure(
        &self,
        binding: u32,
        acceleration_structure: &AccelerationStructure,
    ) {
        let accel_raw = unsafe { acceleration_structure.raw() };
        let mut write_set_as = vk::WriteDescriptorSetAccelerationStructureKHR::builder()
            .acceleration_structures(slice::from_ref(&accel_raw));
        let mut write_set = vk::WriteDescriptorSet::builder()
            .descriptor_type(vk::DescriptorType::ACCELERATION_STRUCTURE_KHR)
            .dst_set(self.raw)
            .dst_binding(binding)
            .push_next(&mut write_set_as)
            .build();
        write_set.descriptor_count = 1;

        unsafe {
            self.device()
                .raw()
                .update_descriptor_sets(slice::from_ref(&write_set), &[])
        };
    }

    pub fn device(&self) -> &Arc<Device> {
        self.pool.device()
    }

    pub unsafe fn raw(&self) -> vk::DescriptorSet {
        self.raw
    }
}
