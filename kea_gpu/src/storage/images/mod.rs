mod image;
mod image_view;
mod sampler;
mod unallocated_image;

pub use image::Image;
pub use image_view::ImageView;
pub use sampler::{Sampler, SamplerFilter};
pub use unallocated_image::UnallocatedImage;
