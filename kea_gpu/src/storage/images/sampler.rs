use crate::{device::Device, Result};
use ash::vk;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplerFilter {
    Point,
    Linear,
}

impl From<SamplerFilter> for vk::Filter {
    fn from(filter: SamplerFilter) -> Self {
        match filter {
            SamplerFilter::Point => vk::Filter::NEAREST,
            SamplerFilter::Linear => vk::Filter::LINEAR,
        }
    }
}

impl From<SamplerFilter> for vk::SamplerMipmapMode {
    fn from(filter: SamplerFilter) -> Self {
        match filter {
            SamplerFilter::Point => vk::SamplerMipmapMode::NEAREST,
            SamplerFilter::Linear => vk::SamplerMipmapMode::LINEAR,
        }
    }
}

pub struct Sampler {
    device: Arc<Device>,
    raw: vk::Sampler,
}

impl Sampler {
    /// Creates a wrapping sampler. Anisotropy is clamped to what the device supports
    /// and disabled entirely when `max_anisotropy` is 1 or less.
    pub fn new(
        device: Arc<Device>,
        min: SamplerFilter,
        mag: SamplerFilter,
        mip: SamplerFilter,
        max_anisotropy: f32,
    ) -> Result<Sampler> {
        let max_anisotropy = max_anisotropy.min(device.physical_device().max_sampler_anisotropy());
        let create_info = vk::SamplerCreateInfo::builder()
            .min_filter(min.into())
            .mag_filter(mag.into())
            .mipmap_mode(mip.into())
            .address_mode_u(vk::SamplerAddressMode::REPEAT)
            .address_mode_v(vk::SamplerAddressMode::REPEAT)
            .address_mode_w(vk::SamplerAddressMode::REPEAT)
            .anisotropy_enable(max_anisotropy > 1.0)
            .max_anisotropy(max_anisotropy.max(1.0))
            .max_lod(vk::LOD_CLAMP_NONE);

        let raw = unsafe { device.raw().create_sampler(&create_info, None) }?;

        Ok(Sampler { device, raw })
    }

    pub unsafe fn raw(&self) -> vk::Sampler {
        self.raw
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        unsafe {
            self.device.raw().destroy_sampler(self.raw, None);
        }
    }
}
