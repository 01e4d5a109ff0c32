use crate::{GpuError, Result};
use ash::extensions::khr;
use std::os::raw::c_char;

#[derive(Default)]
pub struct DeviceExtensions {
    acceleration_structure: Option<khr::AccelerationStructure>,
    ray_tracing_pipeline: Option<khr::RayTracingPipeline>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ext {
    AccelerationStructure,
    DeferredHostOperations,
    RayTracingPipeline,
}

impl Ext {
    pub fn name(&self) -> *const c_char {
        match self {
            Ext::AccelerationStructure => khr::AccelerationStructure::name().as_ptr(),
            Ext::DeferredHostOperations => khr::DeferredHostOperations::name().as_ptr(),
            Ext::RayTracingPipeline => khr::RayTracingPipeline::name().as_ptr(),
        }
    }
}

impl DeviceExtensions {
    pub fn acceleration_structure(&self) -> Result<&khr::AccelerationStructure> {
        self.acceleration_structure
            .as_ref()
            .ok_or(GpuError::MissingExtension("VK_KHR_acceleration_structure"))
    }

    pub fn ray_tracing_pipeline(&self) -> Result<&khr::RayTracingPipeline> {
        self.ray_tracing_pipeline
            .as_ref()
            .ok_or(GpuError::MissingExtension("VK_KHR_ray_tracing_pipeline"))
    }

    pub fn new(device: &ash::Device, instance: &ash::Instance, extensions: &[Ext]) -> Self {
        let mut ext = DeviceExtensions::default();

        for extension in extensions {
            match extension {
                Ext::AccelerationStructure => {
                    ext.acceleration_structure =
                        Some(khr::AccelerationStructure::new(instance, device))
                }
                Ext::DeferredHostOperations => (),
                Ext::RayTracingPipeline => {
                    ext.ray_tracing_pipeline = Some(khr::RayTracingPipeline::new(instance, device))
                }
            }
        }

        ext
    }
}
