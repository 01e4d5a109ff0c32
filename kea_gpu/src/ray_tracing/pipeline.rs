use crate::{
    device::Device,
    pipelines::{Pipeline, PipelineLayout},
    shaders::{ShaderGroupKind, ShaderGroups},
    GpuError, Result,
};
use ash::vk;
use std::{slice, sync::Arc};

pub struct RayTracingPipeline {
    layout: PipelineLayout,
    pipeline: Pipeline,
    group_kinds: Vec<ShaderGroupKind>,
}

impl RayTracingPipeline {
    pub fn new(
        device: Arc<Device>,
        shader_groups: &ShaderGroups,
        layout: PipelineLayout,
        max_recursion_depth: u32,
    ) -> Result<Self> {
        // The group create-infos point into `shaders` and are only read during creation.
        let shaders = shader_groups.build();
        let max_recursion_depth = max_recursion_depth.min(
            device
                .physical_device()
                .ray_tracing_properties()
                .max_ray_recursion_depth,
        );

        let stages: Vec<vk::PipelineShaderStageCreateInfo> = shaders
            .stages
            .iter()
            .map(|(name, stage, entry_point)| {
                vk::PipelineShaderStageCreateInfo::builder()
                    .stage(*stage)
                    .module(unsafe { entry_point.module().raw() })
                    .name(name)
                    .build()
            })
            .collect();

        let create_info = vk::RayTracingPipelineCreateInfoKHR::builder()
            .stages(&stages)
            .groups(&shaders.groups)
            .max_pipeline_ray_recursion_depth(max_recursion_depth)
            .layout(unsafe { layout.raw() })
            .build();

        let raw = unsafe {
            device
                .ext()
                .ray_tracing_pipeline()?
                .create_ray_tracing_pipelines(
                    vk::DeferredOperationKHR::null(),
                    vk::PipelineCache::null(),
                    slice::from_ref(&create_info),
                    None,
                )
        }
        .map_err(|err| GpuError::PipelineCreation(format!("{:?}", err)))?
        .into_iter()
        .next()
        .ok_or_else(|| GpuError::PipelineCreation("no pipeline was returned".to_string()))?;

        log::debug!(
            "Created ray tracing pipeline with {} stages in {} groups",
            stages.len(),
            shaders.groups.len()
        );

        Ok(Self {
            layout,
            pipeline: unsafe { Pipeline::new(device, raw, vk::PipelineBindPoint::RAY_TRACING_KHR) },
            group_kinds: shader_groups.kinds(),
        })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn layout(&self) -> &PipelineLayout {
        &self.layout
    }

    pub fn group_kinds(&self) -> &[ShaderGroupKind] {
        &self.group_kinds
    }
}
