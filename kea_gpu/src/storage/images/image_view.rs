use super::Image;
use crate::{device::Device, storage::commands::COLOR_RANGE, Result};
use ash::vk;
use std::sync::Arc;

/// A 2D view over the single color mip and layer of an [`Image`].
pub struct ImageView {
    image: Arc<Image>,
    raw: vk::ImageView,
}

impl ImageView {
    pub fn new(image: Arc<Image>) -> Result<Self> {
        let create_info = vk::ImageViewCreateInfo::builder()
            .image(unsafe { image.raw() })
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(image.format())
            .components(vk::ComponentMapping::default())
            .subresource_range(COLOR_RANGE);

        let raw = unsafe { image.device().raw().create_image_view(&create_info, None)? };
        log::trace!("Created view of {}", image.name());

        Ok(Self { image, raw })
    }

    pub unsafe fn raw(&self) -> vk::ImageView {
        self.raw
    }

    pub fn device(&self) -> &Arc<Device> {
        self.image.device()
    }

    pub fn image(&self) -> &Arc<Image> {
        &self.image
    }
}

impl Drop for ImageView {
    fn drop(&mut self) {
        unsafe {
            self.device().raw().destroy_image_view(self.raw, None);
        }
    }
}
