use super::{CommandBufferRecorder, CommandPool};
use crate::{device::Device, sync::Fence, Result};
use ash::vk;
use std::sync::Arc;

pub struct CommandBuffer {
    name: String,
    pool: Arc<CommandPool>,
    raw: vk::CommandBuffer,
}

impl CommandBuffer {
    pub unsafe fn new(name: String, pool: Arc<CommandPool>, raw: vk::CommandBuffer) -> Self {
        Self { name, pool, raw }
    }

    /// Records `func` into a one-shot command buffer, submits it to the
    /// compute queue and blocks until the GPU has finished executing it.
    pub fn now<F>(device: &Arc<Device>, name: String, func: F) -> Result<()>
    where
        F: FnOnce(&CommandBufferRecorder) -> Result<()>,
    {
        CommandPool::new(device.compute_queue()?)?
            .allocate_buffer(name)?
            .record(func)?
            .submit()?
            .wait()
    }

    pub fn record<F>(self, func: F) -> Result<RecordedCommandBuffer>
    where
        F: FnOnce(&CommandBufferRecorder) -> Result<()>,
    {
        self.begin()?;
        func(&CommandBufferRecorder::new(&self))?;
        self.end()?;

        Ok(RecordedCommandBuffer { buffer: self })
    }

    fn begin(&self) -> Result<()> {
        log::trace!("{}: recording", self.name);
        let begin_info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { self.device().raw().begin_command_buffer(self.raw, &begin_info) }?;
        Ok(())
    }

    fn end(&self) -> Result<()> {
        log::trace!("{}: recording complete", self.name);
        unsafe { self.device().raw().end_command_buffer(self.raw) }?;
        Ok(())
    }

    pub fn device(&self) -> &Arc<Device> {
        self.pool.device()
    }

    pub unsafe fn raw(&self) -> vk::CommandBuffer {
        self.raw
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        unsafe {
            self.device()
                .raw()
                .free_command_buffers(self.pool.raw(), &[self.raw]);
        }
    }
}

#[must_use]
pub struct RecordedCommandBuffer {
    buffer: CommandBuffer,
}

impl RecordedCommandBuffer {
    pub fn submit(self) -> Result<SubmittedCommandBuffer> {
        let fence = self.buffer.pool.queue().submit(&[&self.buffer])?;

        Ok(SubmittedCommandBuffer {
            buffer: self.buffer,
            fence: Some(fence),
        })
    }

    pub unsafe fn raw(&self) -> vk::CommandBuffer {
        self.buffer.raw()
    }
}

#[must_use]
pub struct SubmittedCommandBuffer {
    buffer: CommandBuffer,
    fence: Option<Fence>,
}

impl SubmittedCommandBuffer {
    pub fn wait(mut self) -> Result<()> {
        log::debug!("Waiting upon command {}", self.buffer.name());
        if let Some(fence) = self.fence.take() {
            fence.wait()?;
        }
        log::debug!("Command {} complete", self.buffer.name());
        Ok(())
    }
}

impl Drop for SubmittedCommandBuffer {
    fn drop(&mut self) {
        if let Some(fence) = self.fence.take() {
            log::warn!("Submitted command buffer dropped before being waited upon - forcing wait");
            if let Err(err) = fence.wait() {
                log::error!("Command {} failed: {}", self.buffer.name(), err);
            }
        }
    }
}
