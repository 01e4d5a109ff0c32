use super::{buffers::Buffer, images::Image};
use crate::commands::CommandBufferRecorder;
use ash::vk;
use std::slice;

pub(super) const COLOR_RANGE: vk::ImageSubresourceRange = vk::ImageSubresourceRange {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    base_mip_level: 0,
    level_count: 1,
    base_array_layer: 0,
    layer_count: 1,
};

const COLOR_LAYERS: vk::ImageSubresourceLayers = vk::ImageSubresourceLayers {
    aspect_mask: vk::ImageAspectFlags::COLOR,
    mip_level: 0,
    base_array_layer: 0,
    layer_count: 1,
};

impl<'a> CommandBufferRecorder<'a> {
    pub fn copy_buffer(&self, source: &Buffer, destination: &Buffer) {
        let copy = vk::BufferCopy {
            src_offset: 0,
            dst_offset: 0,
            size: source.size().min(destination.size()),
        };

        unsafe {
            self.device().raw().cmd_copy_buffer(
                self.buffer().raw(),
                source.raw(),
                destination.raw(),
                slice::from_ref(&copy),
            );
        }
    }

    pub fn transition_image_layout(
        &self,
        image: &Image,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) {
        let barrier = vk::ImageMemoryBarrier::builder()
            .image(unsafe { image.raw() })
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
            .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .subresource_range(COLOR_RANGE)
            .build();

        self.pipeline_barrier(
            vk::PipelineStageFlags::ALL_COMMANDS,
            vk::PipelineStageFlags::ALL_COMMANDS,
            &[],
            &[barrier],
        );
    }

    /// Clears every texel of an image held in the `GENERAL` layout.
    pub fn clear_color_image(&self, image: &Image, color: [f32; 4]) {
        let clear = vk::ClearColorValue { float32: color };

        unsafe {
            self.device().raw().cmd_clear_color_image(
                self.buffer().raw(),
                image.raw(),
                vk::ImageLayout::GENERAL,
                &clear,
                slice::from_ref(&COLOR_RANGE),
            );
        }
    }

    pub fn copy_buffer_to_image(&self, source: &Buffer, destination: &Image) {
        let (width, height) = destination.size();
        let region = vk::BufferImageCopy::builder()
            .image_subresource(COLOR_LAYERS)
            .image_extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .build();

        unsafe {
            self.device().raw().cmd_copy_buffer_to_image(
                self.buffer().raw(),
                source.raw(),
                destination.raw(),
                vk::ImageLayout::GENERAL,
                slice::from_ref(&region),
            );
        }
    }

    pub fn copy_image_to_buffer(&self, source: &Image, destination: &Buffer) {
        let (width, height) = source.size();
        let region = vk::BufferImageCopy::builder()
            .image_subresource(COLOR_LAYERS)
            .image_extent(vk::Extent3D {
                width,
                height,
                depth: 1,
            })
            .build();

        unsafe {
            self.device().raw().cmd_copy_image_to_buffer(
                self.buffer().raw(),
                source.raw(),
                vk::ImageLayout::GENERAL,
                destination.raw(),
                slice::from_ref(&region),
            );
        }
    }
}
