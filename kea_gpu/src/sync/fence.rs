use crate::{device::Device, Result};
use ash::vk;
use std::{slice, sync::Arc};

pub struct Fence {
    name: String,
    device: Arc<Device>,
    raw: vk::Fence,
}

impl Fence {
    pub fn new(device: Arc<Device>, name: String, signaled: bool) -> Result<Fence> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        let create_info = vk::FenceCreateInfo::builder().flags(flags);
        let raw = unsafe { device.raw().create_fence(&create_info, None) }?;

        Ok(Fence { name, device, raw })
    }

    pub fn wait(&self) -> Result<()> {
        unsafe {
            self.device
                .raw()
                .wait_for_fences(slice::from_ref(&self.raw), true, u64::MAX)
        }?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub unsafe fn raw(&self) -> vk::Fence {
        self.raw
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_fence(self.raw, None);
        }
    }
}
