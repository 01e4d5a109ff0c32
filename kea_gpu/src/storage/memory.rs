use crate::{device::Device, GpuError, Result};
use ash::vk;
use gpu_allocator::{
    vulkan::{AllocationCreateDesc, AllocationScheme},
    MemoryLocation,
};
use std::{mem::ManuallyDrop, sync::Arc};

/// Rounds `size_or_address` up to the next multiple of `alignment`, which must be a power of two.
pub fn align(size_or_address: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (size_or_address + (alignment - 1)) & !(alignment - 1)
}

pub struct Allocation {
    device: Arc<Device>,
    allocation: ManuallyDrop<gpu_allocator::vulkan::Allocation>,
    name: String,
}

// The mapping is only written through `&mut self`.
unsafe impl Send for Allocation {}
unsafe impl Sync for Allocation {}

impl Allocation {
    pub fn new(
        device: Arc<Device>,
        name: String,
        location: MemoryLocation,
        requirements: vk::MemoryRequirements,
        linear: bool,
    ) -> Result<Self> {
        log::debug!("Allocating {:?}", name);

        let allocation = device.allocator().lock().allocate(&AllocationCreateDesc {
            name: &name,
            requirements,
            location,
            linear,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;

        Ok(Self {
            device,
            allocation: ManuallyDrop::new(allocation),
            name,
        })
    }

    pub unsafe fn memory(&self) -> vk::DeviceMemory {
        self.allocation.memory()
    }

    pub unsafe fn offset(&self) -> u64 {
        self.allocation.offset()
    }

    pub fn mapped_slice(&self) -> Result<&[u8]> {
        self.allocation
            .mapped_slice()
            .ok_or_else(|| GpuError::NotHostVisible(self.name.clone()))
    }

    pub fn mapped_slice_mut(&mut self) -> Result<&mut [u8]> {
        let name = &self.name;
        self.allocation
            .mapped_slice_mut()
            .ok_or_else(|| GpuError::NotHostVisible(name.clone()))
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        log::debug!("Freeing {:?}", self.name);

        let allocation = unsafe { ManuallyDrop::take(&mut self.allocation) };
        if let Err(err) = self.device.allocator().lock().free(allocation) {
            log::error!("Failed to free {:?}: {}", self.name, err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::align;

    #[test]
    fn align_rounds_up_to_the_alignment() {
        assert_eq!(align(0, 64), 0);
        assert_eq!(align(1, 64), 64);
        assert_eq!(align(64, 64), 64);
        assert_eq!(align(65, 64), 128);
        assert_eq!(align(32 + 12, 32), 64);
    }
}
