use crate::{commands::CommandBuffer, device::Device, device::QueueFamily, sync::Fence, Result};
use ash::vk;
use std::{slice, sync::Arc};

pub struct Queue {
    device: Arc<Device>,
    raw: vk::Queue,
    family: QueueFamily,
}

impl Queue {
    pub unsafe fn new_from_raw(device: Arc<Device>, raw: vk::Queue, family: QueueFamily) -> Self {
        Self {
            device,
            raw,
            family,
        }
    }

    pub unsafe fn raw(&self) -> vk::Queue {
        self.raw
    }

    pub fn family(&self) -> &QueueFamily {
        &self.family
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    pub fn submit(&self, buffers: &[&CommandBuffer]) -> Result<Fence> {
        let raw_buffers: Vec<vk::CommandBuffer> =
            buffers.iter().map(|c| unsafe { c.raw() }).collect();
        let submit_info = vk::SubmitInfo::builder()
            .command_buffers(&raw_buffers)
            .build();

        let fence = Fence::new(self.device.clone(), "queue submit".to_string(), false)?;

        unsafe {
            self.device
                .raw()
                .queue_submit(self.raw, slice::from_ref(&submit_info), fence.raw())
        }?;

        Ok(fence)
    }

    pub fn wait_until_idle(&self) -> Result<()> {
        unsafe { self.device.raw().queue_wait_idle(self.raw) }?;
        Ok(())
    }
}
