use super::Geometry;
use crate::Result;
use ash::vk;
use glam::Mat4;
use std::sync::Arc;

pub struct GeometryInstance {
    transform: Mat4,
    custom_index: u32,
    geometry: Arc<Geometry>,
}

impl GeometryInstance {
    pub fn new(geometry: Arc<Geometry>) -> Self {
        Self {
            transform: Mat4::IDENTITY,
            custom_index: 0,
            geometry,
        }
    }

    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Value returned by `gl_InstanceCustomIndexEXT`; only the low 24 bits are kept.
    pub fn with_custom_index(mut self, custom_index: u32) -> Self {
        self.custom_index = custom_index & 0x00ff_ffff;
        self
    }

    pub fn geometry(&self) -> &Arc<Geometry> {
        &self.geometry
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Row-major 3x4 matrix as expected by `VkTransformMatrixKHR`.
    pub fn transform_matrix(&self) -> vk::TransformMatrixKHR {
        let rows = self.transform.transpose().to_cols_array();
        let mut matrix = [0.0; 12];
        matrix.copy_from_slice(&rows[..12]);
        vk::TransformMatrixKHR { matrix }
    }

    pub fn raw(&self, shader_binding_table_record_offset: u32) -> Result<vk::AccelerationStructureInstanceKHR> {
        let mask = 0xff;
        let flags = vk::GeometryInstanceFlagsKHR::TRIANGLE_FACING_CULL_DISABLE.as_raw() as u8;

        Ok(vk::AccelerationStructureInstanceKHR {
            transform: self.transform_matrix(),
            instance_custom_index_and_mask: vk::Packed24_8::new(self.custom_index, mask),
            instance_shader_binding_table_record_offset_and_flags: vk::Packed24_8::new(
                shader_binding_table_record_offset,
                flags,
            ),
            acceleration_structure_reference: vk::AccelerationStructureReferenceKHR {
                device_handle: self.geometry.acceleration_structure()?.device_address()?,
            },
        })
    }
}
