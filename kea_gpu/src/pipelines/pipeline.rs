use crate::device::Device;
use ash::vk;
use std::sync::Arc;

/// An owned pipeline object together with the bind point it is used at.
pub struct Pipeline {
    device: Arc<Device>,
    raw: vk::Pipeline,
    bind_point: vk::PipelineBindPoint,
}

impl Pipeline {
    /// Takes ownership of `raw`, which must have been created on `device`.
    pub unsafe fn new(device: Arc<Device>, raw: vk::Pipeline, bind_point: vk::PipelineBindPoint) -> Self {
        Self {
            device,
            raw,
            bind_point,
        }
    }

    pub unsafe fn raw(&self) -> vk::Pipeline {
        self.raw
    }

    pub fn bind_point(&self) -> vk::PipelineBindPoint {
        self.bind_point
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        log::trace!("Destroying {:?} pipeline", self.bind_point);
        unsafe {
            self.device.raw().destroy_pipeline(self.raw, None);
        }
    }
}
