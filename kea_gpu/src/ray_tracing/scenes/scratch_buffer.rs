use crate::{device::Device, storage::buffers::Buffer, Result};
use ash::vk;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

pub struct ScratchBuffer {
    buffer: Buffer,
}

impl ScratchBuffer {
    pub fn new(device: Arc<Device>, size: u64) -> Result<ScratchBuffer> {
        let alignment = device
            .physical_device()
            .ray_tracing_properties()
            .min_scratch_offset_alignment;

        let buffer = Buffer::new_with_alignment(
            device,
            size,
            alignment.max(1) as u64,
            vk::BufferUsageFlags::STORAGE_BUFFER,
            "acceleration structure build scratch".to_string(),
            MemoryLocation::GpuOnly,
        )?;

        Ok(ScratchBuffer { buffer })
    }

    pub fn device_address(&self) -> vk::DeviceAddress {
        self.buffer.device_address()
    }
}
