use super::ShaderStage;
use crate::{device::Device, Result};
use ash::{util::read_spv, vk};
use std::{fs::File, path::Path, sync::Arc};

pub struct ShaderModule {
    device: Arc<Device>,
    name: String,
    raw: vk::ShaderModule,
}

impl ShaderModule {
    pub fn new(device: Arc<Device>, name: String, code: &[u32]) -> Result<Arc<ShaderModule>> {
        let shader_create_info = vk::ShaderModuleCreateInfo::builder().code(code);
        let raw = unsafe { device.raw().create_shader_module(&shader_create_info, None) }?;

        log::debug!("Created shader module {}", name);

        Ok(Arc::new(ShaderModule { device, name, raw }))
    }

    pub fn from_file(device: Arc<Device>, path: &Path) -> Result<Arc<ShaderModule>> {
        let code = read_spv(&mut File::open(path)?)?;
        Self::new(device, path.display().to_string(), &code)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub unsafe fn raw(&self) -> vk::ShaderModule {
        self.raw
    }

    pub fn entry_point(self: &Arc<Self>, name: &str, stage: ShaderStage) -> ShaderEntryPoint {
        ShaderEntryPoint {
            module: self.clone(),
            name: name.to_string(),
            stage,
        }
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_shader_module(self.raw, None);
        }
    }
}

#[derive(Clone)]
pub struct ShaderEntryPoint {
    module: Arc<ShaderModule>,
    name: String,
    stage: ShaderStage,
}

impl ShaderEntryPoint {
    pub fn module(&self) -> &ShaderModule {
        &self.module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }
}
