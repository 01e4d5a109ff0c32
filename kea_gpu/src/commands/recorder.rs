use super::CommandBuffer;
use crate::{
    descriptors::DescriptorSet,
    device::Device,
    pipelines::{Pipeline, PipelineLayout},
};
use ash::vk;
use std::sync::Arc;

pub struct CommandBufferRecorder<'a> {
    buffer: &'a CommandBuffer,
}

impl<'a> CommandBufferRecorder<'a> {
    pub fn new(buffer: &'a CommandBuffer) -> Self {
        Self { buffer }
    }

    pub fn device(&self) -> &Arc<Device> {
        self.buffer.device()
    }

    pub fn bind_pipeline(&self, pipeline: &Pipeline) {
        unsafe {
            self.device().raw().cmd_bind_pipeline(
                self.buffer.raw(),
                pipeline.bind_point(),
                pipeline.raw(),
            )
        }
    }

    /// Binds `descriptor_sets` from set 0 at the bind point of `pipeline`.
    pub fn bind_descriptor_sets(
        &self,
        pipeline: &Pipeline,
        layout: &PipelineLayout,
        descriptor_sets: &[&DescriptorSet],
    ) {
        let raw_sets: Vec<vk::DescriptorSet> =
            descriptor_sets.iter().map(|ds| unsafe { ds.raw() }).collect();

        unsafe {
            self.device().raw().cmd_bind_descriptor_sets(
                self.buffer.raw(),
                pipeline.bind_point(),
                layout.raw(),
                0,
                &raw_sets,
                &[],
            );
        }
    }

    pub fn push_constants(&self, layout: &PipelineLayout, stages: vk::ShaderStageFlags, data: &[u8]) {
        if data.is_empty() {
            return;
        }

        unsafe {
            self.device()
                .raw()
                .cmd_push_constants(self.buffer.raw(), layout.raw(), stages, 0, data);
        }
    }

    pub fn pipeline_barrier(
        &self,
        src_stage_mask: vk::PipelineStageFlags,
        dst_stage_mask: vk::PipelineStageFlags,
        memory_barriers: &[vk::MemoryBarrier],
        image_memory_barriers: &[vk::ImageMemoryBarrier],
    ) {
        unsafe {
            self.device().raw().cmd_pipeline_barrier(
                self.buffer.raw(),
                src_stage_mask,
                dst_stage_mask,
                vk::DependencyFlags::empty(),
                memory_barriers,
                &[],
                image_memory_barriers,
            );
        }
    }

    /// A full memory barrier between everything recorded so far and everything after it.
    pub fn barrier_all(&self) {
        let barrier = vk::MemoryBarrier::builder()
            .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
            .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE)
            .build();

        self.pipeline_barrier(
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::PipelineStageFlags::ALL_COMMANDS,
            &[barrier],
            &[],
        );
    }

    pub unsafe fn buffer(&self) -> &CommandBuffer {
        self.buffer
    }
}
