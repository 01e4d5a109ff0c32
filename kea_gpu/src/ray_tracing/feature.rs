use crate::{
    device::{self, DeviceConfig},
    features::Feature,
};

/// Enables the KHR ray tracing pipeline and acceleration structure extensions.
#[derive(Default)]
pub struct RayTracingFeature {}

impl RayTracingFeature {
    pub fn new() -> Self {
        Self {}
    }
}

impl Feature for RayTracingFeature {
    fn device_extensions(&self) -> Vec<device::Ext> {
        vec![
            device::Ext::AccelerationStructure,
            device::Ext::DeferredHostOperations,
            device::Ext::RayTracingPipeline,
        ]
    }

    fn configure_device(&self, config: &mut DeviceConfig) {
        config.ray_tracing = true;
        config.sampler_anisotropy = true;
    }
}
