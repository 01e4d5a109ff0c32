use super::Buffer;
use crate::{commands::CommandBuffer, device::Device, Result};
use ash::vk;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

/// A host visible staging buffer whose contents are copied into a GPU only
/// buffer of the same size.
pub struct TransferBuffer {
    device: Arc<Device>,
    name: String,
    cpu_buffer: Buffer,
    usage: vk::BufferUsageFlags,
}

impl TransferBuffer {
    pub fn new(
        device: Arc<Device>,
        size: u64,
        usage: vk::BufferUsageFlags,
        name: String,
    ) -> Result<TransferBuffer> {
        let cpu_buffer = Buffer::new(
            device.clone(),
            size,
            vk::BufferUsageFlags::TRANSFER_SRC,
            format!("{} transfer", name),
            MemoryLocation::CpuToGpu,
        )?;

        Ok(TransferBuffer {
            device,
            name,
            cpu_buffer,
            usage,
        })
    }

    pub fn cpu_buffer(&mut self) -> &mut Buffer {
        &mut self.cpu_buffer
    }

    pub fn transfer_to_gpu(&mut self) -> Result<Buffer> {
        let usage = self.usage | vk::BufferUsageFlags::TRANSFER_DST;
        let gpu_buffer = Buffer::new(
            self.device.clone(),
            self.cpu_buffer.size(),
            usage,
            self.name.clone(),
            MemoryLocation::GpuOnly,
        )?;

        CommandBuffer::now(&self.device, format!("{} upload", self.name), |cmd| {
            cmd.copy_buffer(&self.cpu_buffer, &gpu_buffer);
            Ok(())
        })?;

        Ok(gpu_buffer)
    }
}
