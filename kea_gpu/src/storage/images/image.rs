use super::unallocated_image::UnallocatedImage;
use crate::{device::Device, storage::memory::Allocation, Result};
use ash::vk;
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

pub struct Image {
    name: String,
    image: UnallocatedImage,
    _allocation: Allocation,
}

impl Image {
    pub fn new(
        device: Arc<Device>,
        size: (u32, u32),
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        name: String,
        location: MemoryLocation,
    ) -> Result<Self> {
        UnallocatedImage::new(device, size, format, usage)?.allocate(name, location)
    }

    pub unsafe fn from_bound_allocation(
        name: String,
        image: UnallocatedImage,
        allocation: Allocation,
    ) -> Self {
        Self {
            name,
            image,
            _allocation: allocation,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.size()
    }

    pub fn format(&self) -> vk::Format {
        self.image.format()
    }

    pub fn device(&self) -> &Arc<Device> {
        self.image.device()
    }

    pub unsafe fn raw(&self) -> vk::Image {
        self.image.raw()
    }
}
