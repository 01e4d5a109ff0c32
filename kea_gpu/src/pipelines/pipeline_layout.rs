use crate::{descriptors::DescriptorSetLayout, device::Device, Result};
use ash::vk;
use std::{slice, sync::Arc};

pub struct PipelineLayout {
    device: Arc<Device>,
    raw: vk::PipelineLayout,
    descriptor_set_layout: DescriptorSetLayout,
}

impl PipelineLayout {
    /// A layout with a single descriptor set and, when `push_constant_size` is
    /// non-zero, one push constant range visible to `push_constant_stages`.
    pub fn new(
        device: Arc<Device>,
        descriptor_set_layout: DescriptorSetLayout,
        push_constant_stages: vk::ShaderStageFlags,
        push_constant_size: u32,
    ) -> Result<PipelineLayout> {
        let push_constants = (push_constant_size > 0).then(|| {
            vk::PushConstantRange::builder()
                .stage_flags(push_constant_stages)
                .offset(0)
                .size(push_constant_size)
                .build()
        });

        let layout_raw = unsafe { descriptor_set_layout.raw() };
        let ranges = push_constants.as_slice();
        let create_info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(slice::from_ref(&layout_raw))
            .push_constant_ranges(ranges);

        let raw = unsafe { device.raw().create_pipeline_layout(&create_info, None) }?;

        Ok(PipelineLayout {
            device,
            raw,
            descriptor_set_layout,
        })
    }

    pub unsafe fn raw(&self) -> vk::PipelineLayout {
        self.raw
    }

    pub fn descriptor_set_layout(&self) -> &DescriptorSetLayout {
        &self.descriptor_set_layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_pipeline_layout(self.raw, None);
        }
    }
}
