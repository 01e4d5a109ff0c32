use crate::{backend::Extent2D, error::Result};
use ash::vk;
use glam::Vec4;
use gpu_allocator::MemoryLocation;
use kea_gpu::{
    commands::CommandBuffer,
    device::Device,
    storage::{
        buffers::Buffer,
        images::{Image, ImageView, Sampler},
    },
};
use std::{fmt, path::Path, sync::Arc};

const FORMAT: vk::Format = vk::Format::R32G32B32A32_SFLOAT;
const TEXEL_SIZE: u64 = 16;

/// An RGBA32F image kept in the `GENERAL` layout so ray tracing shaders,
/// clears and copies can all use it without transitions.
#[derive(Clone)]
pub struct VulkanTexture {
    view: Arc<ImageView>,
}

impl VulkanTexture {
    pub fn new(device: &Arc<Device>, name: &str, extent: Extent2D) -> Result<Self> {
        let image = Arc::new(Image::new(
            device.clone(),
            (extent.width, extent.height),
            FORMAT,
            vk::ImageUsageFlags::STORAGE
                | vk::ImageUsageFlags::SAMPLED
                | vk::ImageUsageFlags::TRANSFER_SRC
                | vk::ImageUsageFlags::TRANSFER_DST,
            name.to_string(),
            MemoryLocation::GpuOnly,
        )?);

        CommandBuffer::now(device, format!("{} layout", name), |cmd| {
            cmd.transition_image_layout(
                &image,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::GENERAL,
            );
            Ok(())
        })?;

        Ok(Self {
            view: Arc::new(ImageView::new(image)?),
        })
    }

    pub fn from_texels(
        device: &Arc<Device>,
        name: &str,
        extent: Extent2D,
        texels: &[Vec4],
    ) -> Result<Self> {
        let texture = Self::new(device, name, extent)?;
        let floats: Vec<f32> = texels.iter().flat_map(|texel| texel.to_array()).collect();
        let staging = Buffer::new_from_data(
            device.clone(),
            &floats,
            vk::BufferUsageFlags::TRANSFER_SRC,
            format!("{} upload", name),
            MemoryLocation::CpuToGpu,
        )?;

        CommandBuffer::now(device, format!("upload {}", name), |cmd| {
            cmd.copy_buffer_to_image(&staging, texture.image());
            Ok(())
        })?;

        Ok(texture)
    }

    /// Decodes an image file into a texture.
    pub fn load(device: &Arc<Device>, path: &Path) -> Result<Self> {
        let decoded = image::open(path)?.into_rgba32f();
        let extent = Extent2D::new(decoded.width(), decoded.height());
        let texels: Vec<Vec4> = decoded.pixels().map(|pixel| Vec4::from_array(pixel.0)).collect();
        log::info!(
            "Loaded environment map {} ({}x{})",
            path.display(),
            extent.width,
            extent.height
        );
        Self::from_texels(device, &path.display().to_string(), extent, &texels)
    }

    pub fn image(&self) -> &Arc<Image> {
        self.view.image()
    }

    pub fn view(&self) -> &ImageView {
        &self.view
    }

    pub fn extent(&self) -> Extent2D {
        let (width, height) = self.image().size();
        Extent2D::new(width, height)
    }

    pub fn clear(&self, color: Vec4) -> Result<()> {
        let image = self.image();
        CommandBuffer::now(image.device(), format!("clear {}", image.name()), |cmd| {
            cmd.clear_color_image(image, color.to_array());
            cmd.barrier_all();
            Ok(())
        })?;
        Ok(())
    }

    pub fn read(&self) -> Result<Vec<Vec4>> {
        let image = self.image();
        let extent = self.extent();
        let staging = Buffer::new(
            image.device().clone(),
            extent.texel_count() as u64 * TEXEL_SIZE,
            vk::BufferUsageFlags::TRANSFER_DST,
            format!("{} readback", image.name()),
            MemoryLocation::GpuToCpu,
        )?;

        CommandBuffer::now(image.device(), format!("read {}", image.name()), |cmd| {
            cmd.copy_image_to_buffer(image, &staging);
            Ok(())
        })?;

        Ok(staging
            .read()?
            .chunks_exact(TEXEL_SIZE as usize)
            .map(|texel| Vec4::from_array(bytemuck::pod_read_unaligned(texel)))
            .collect())
    }
}

impl PartialEq for VulkanTexture {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.view, &other.view)
    }
}

impl fmt::Debug for VulkanTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let extent = self.extent();
        write!(f, "VulkanTexture({} {}x{})", self.image().name(), extent.width, extent.height)
    }
}

#[derive(Clone)]
pub struct VulkanSampler(pub(super) Arc<Sampler>);

impl VulkanSampler {
    pub fn raw(&self) -> &Sampler {
        &self.0
    }
}

impl PartialEq for VulkanSampler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for VulkanSampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VulkanSampler")
    }
}
