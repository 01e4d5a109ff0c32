use super::CommandBuffer;
use crate::{device::Device, queues::Queue, GpuError, Result};
use ash::vk;
use std::{slice, sync::Arc};

pub struct CommandPool {
    queue: Queue,
    raw: vk::CommandPool,
}

impl CommandPool {
    pub fn new(queue: Queue) -> Result<Arc<CommandPool>> {
        let create_info =
            vk::CommandPoolCreateInfo::builder().queue_family_index(queue.family().index());
        let raw = unsafe { queue.device().raw().create_command_pool(&create_info, None) }?;

        Ok(Arc::new(CommandPool { queue, raw }))
    }

    pub fn allocate_buffers(self: &Arc<Self>, names: &[String]) -> Result<Vec<CommandBuffer>> {
        let create_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.raw)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(names.len() as _);

        let raws = unsafe { self.device().raw().allocate_command_buffers(&create_info) }?;

        Ok(names
            .iter()
            .zip(raws)
            .map(|(name, raw)| unsafe { CommandBuffer::new(name.to_string(), self.clone(), raw) })
            .collect())
    }

    pub fn allocate_buffer(self: &Arc<Self>, name: String) -> Result<CommandBuffer> {
        self.allocate_buffers(slice::from_ref(&name))?
            .into_iter()
            .next()
            .ok_or(GpuError::Vulkan(vk::Result::ERROR_OUT_OF_HOST_MEMORY))
    }

    pub fn device(&self) -> &Arc<Device> {
        self.queue.device()
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub unsafe fn raw(&self) -> vk::CommandPool {
        self.raw
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            if let Err(err) = self.queue.wait_until_idle() {
                log::error!("queue_wait_idle failed while destroying command pool: {}", err);
            }
            self.device().raw().destroy_command_pool(self.raw, None);
        }
    }
}
