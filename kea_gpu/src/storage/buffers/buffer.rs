use super::{TransferBuffer, UnallocatedBuffer};
use crate::{device::Device, storage::memory::Allocation, GpuError, Result};
use ash::vk;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

pub struct Buffer {
    name: String,
    // Drop order matters: the vk::Buffer is destroyed before its memory is freed.
    buffer: UnallocatedBuffer,
    allocation: Allocation,
    location: MemoryLocation,
}

impl Buffer {
    pub fn new(
        device: Arc<Device>,
        size: u64,
        usage: vk::BufferUsageFlags,
        name: String,
        location: MemoryLocation,
    ) -> Result<Buffer> {
        UnallocatedBuffer::new(device, size, usage)?.allocate(name, location, None)
    }

    pub fn new_with_alignment(
        device: Arc<Device>,
        size: u64,
        alignment: u64,
        usage: vk::BufferUsageFlags,
        name: String,
        location: MemoryLocation,
    ) -> Result<Buffer> {
        UnallocatedBuffer::new(device, size, usage)?.allocate(name, location, Some(alignment))
    }

    pub fn new_from_data<T: bytemuck::Pod>(
        device: Arc<Device>,
        data: &[T],
        usage: vk::BufferUsageFlags,
        name: String,
        location: MemoryLocation,
    ) -> Result<Buffer> {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        match location {
            MemoryLocation::CpuToGpu | MemoryLocation::GpuToCpu => {
                let mut buffer = Buffer::new(device, bytes.len() as _, usage, name, location)?;
                buffer.fill(bytes)?;
                Ok(buffer)
            }
            _ => {
                let mut buffer = TransferBuffer::new(device, bytes.len() as _, usage, name)?;
                buffer.cpu_buffer().fill(bytes)?;
                buffer.transfer_to_gpu()
            }
        }
    }

    pub unsafe fn from_bound_allocation(
        name: String,
        buffer: UnallocatedBuffer,
        allocation: Allocation,
        location: MemoryLocation,
    ) -> Self {
        Self {
            name,
            buffer,
            allocation,
            location,
        }
    }

    pub fn device_address(&self) -> vk::DeviceAddress {
        unsafe {
            let info = vk::BufferDeviceAddressInfo::builder().buffer(self.buffer.raw());
            self.buffer.device().raw().get_buffer_device_address(&info)
        }
    }

    pub fn size(&self) -> u64 {
        self.buffer.size()
    }

    /// Copies `data` into the start of a host visible buffer.
    pub fn fill(&mut self, data: &[u8]) -> Result<()> {
        let slice = self.allocation.mapped_slice_mut()?;
        if data.len() > slice.len() {
            return Err(GpuError::NotHostVisible(format!(
                "{} ({} bytes written into {} bytes)",
                self.name,
                data.len(),
                slice.len()
            )));
        }
        slice[..data.len()].copy_from_slice(data);
        Ok(())
    }

    /// Reads back the contents of a host visible buffer.
    pub fn read(&self) -> Result<Vec<u8>> {
        let slice = self.allocation.mapped_slice()?;
        Ok(slice[..self.size() as usize].to_vec())
    }

    pub fn device(&self) -> &Arc<Device> {
        self.buffer.device()
    }

    pub fn location(&self) -> MemoryLocation {
        self.location
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub unsafe fn raw(&self) -> vk::Buffer {
        self.buffer.raw()
    }
}
