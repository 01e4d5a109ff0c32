use crate::device::PhysicalDevice;
use ash::vk;

/// The device limits that shape shader binding tables and acceleration structure builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayTracingProperties {
    pub shader_group_handle_size: u32,
    pub shader_group_handle_alignment: u32,
    pub shader_group_base_alignment: u32,
    pub max_shader_group_stride: u32,
    pub max_ray_recursion_depth: u32,
    pub min_scratch_offset_alignment: u32,
}

impl PhysicalDevice {
    pub fn ray_tracing_properties(&self) -> RayTracingProperties {
        let mut rt_props = vk::PhysicalDeviceRayTracingPipelinePropertiesKHR::default();
        let mut accel_props = vk::PhysicalDeviceAccelerationStructurePropertiesKHR::default();
        let mut props = vk::PhysicalDeviceProperties2::builder()
            .push_next(&mut rt_props)
            .push_next(&mut accel_props)
            .build();

        unsafe {
            self.vulkan()
                .raw()
                .get_physical_device_properties2(self.raw(), &mut props)
        }

        RayTracingProperties {
            shader_group_handle_size: rt_props.shader_group_handle_size,
            shader_group_handle_alignment: rt_props.shader_group_handle_alignment,
            shader_group_base_alignment: rt_props.shader_group_base_alignment,
            max_shader_group_stride: rt_props.max_shader_group_stride,
            max_ray_recursion_depth: rt_props.max_ray_recursion_depth,
            min_scratch_offset_alignment: accel_props
                .min_acceleration_structure_scratch_offset_alignment,
        }
    }
}
