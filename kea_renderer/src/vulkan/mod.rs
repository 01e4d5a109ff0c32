//! The backend seam implemented on a Vulkan device with KHR ray tracing.

use crate::{
    backend::{
        Extent2D, ProgramReflection, RayTracingBackend, SamplerDesc, TextureDesc, Variables,
    },
    error::Result,
    program::RayProgramDesc,
};
use glam::Vec4;
use kea_gpu::{device::Device, shaders::ShaderLibrary, storage::images::Sampler};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

mod program;
mod scene;
mod texture;

pub use program::{descriptor_bindings, hit_records, ScopeLayout, VulkanProgram};
pub use scene::VulkanScene;
pub use texture::{VulkanSampler, VulkanTexture};

#[derive(Clone)]
pub struct VulkanBackend {
    device: Arc<Device>,
    shaders: Arc<ShaderLibrary>,
}

impl VulkanBackend {
    pub fn new(device: Arc<Device>, shader_dir: impl Into<PathBuf>) -> Self {
        let shaders = Arc::new(ShaderLibrary::new(device.clone(), shader_dir));
        Self { device, shaders }
    }

    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl RayTracingBackend for VulkanBackend {
    type Texture = VulkanTexture;
    type Sampler = VulkanSampler;
    type Scene = VulkanScene;
    type Program = VulkanProgram;

    fn create_texture(&self, desc: &TextureDesc) -> Result<VulkanTexture> {
        log::debug!(
            "Creating texture {} ({}x{})",
            desc.name,
            desc.extent.width,
            desc.extent.height
        );
        VulkanTexture::new(&self.device, &desc.name, desc.extent)
    }

    fn clear_texture(&self, texture: &VulkanTexture, color: Vec4) -> Result<()> {
        texture.clear(color)
    }

    fn read_texture(&self, texture: &VulkanTexture) -> Result<Vec<Vec4>> {
        texture.read()
    }

    fn load_environment_map(&self, path: &Path) -> Result<VulkanTexture> {
        VulkanTexture::load(&self.device, path)
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<VulkanSampler> {
        let sampler = Sampler::new(
            self.device.clone(),
            desc.min,
            desc.mag,
            desc.mip,
            desc.max_anisotropy as f32,
        )?;
        Ok(VulkanSampler(Arc::new(sampler)))
    }

    fn compile_program(&self, desc: &RayProgramDesc) -> Result<(VulkanProgram, ProgramReflection)> {
        VulkanProgram::compile(&self.device, &self.shaders, desc)
    }

    fn dispatch(
        &self,
        program: &VulkanProgram,
        scene: &Arc<VulkanScene>,
        variables: &Variables<Self>,
        extent: Extent2D,
    ) -> Result<()> {
        program.dispatch(&self.device, scene, variables, extent)
    }
}
