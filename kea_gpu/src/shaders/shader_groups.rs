use super::ShaderEntryPoint;
use ash::vk;
use std::ffi::CString;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderGroupKind {
    RayGeneration,
    Miss,
    Hit,
}

pub enum ShaderGroup {
    RayGeneration(ShaderEntryPoint),
    Miss(ShaderEntryPoint),
    TriangleHit {
        closest_hit: Option<ShaderEntryPoint>,
        any_hit: Option<ShaderEntryPoint>,
    },
}

impl ShaderGroup {
    pub fn kind(&self) -> ShaderGroupKind {
        match self {
            ShaderGroup::RayGeneration(_) => ShaderGroupKind::RayGeneration,
            ShaderGroup::Miss(_) => ShaderGroupKind::Miss,
            ShaderGroup::TriangleHit { .. } => ShaderGroupKind::Hit,
        }
    }
}

/// Shader groups in pipeline order: ray generation first, then misses, then hit groups.
pub struct ShaderGroups {
    groups: Vec<ShaderGroup>,
}

impl ShaderGroups {
    pub fn new(groups: Vec<ShaderGroup>) -> Self {
        Self { groups }
    }

    pub fn groups(&self) -> &[ShaderGroup] {
        &self.groups
    }

    pub fn kinds(&self) -> Vec<ShaderGroupKind> {
        self.groups.iter().map(ShaderGroup::kind).collect()
    }

    pub fn build(&self) -> PipelineShaders {
        let mut stages: Vec<(CString, vk::ShaderStageFlags, ShaderEntryPoint)> = vec![];
        let mut add_stage = |entry: &ShaderEntryPoint| -> u32 {
            let index = stages.len() as u32;
            // Entry point names were resolved against a manifest and never contain NUL bytes.
            let name = CString::new(entry.name()).unwrap_or_default();
            stages.push((name, entry.stage().into(), entry.clone()));
            index
        };

        let groups = self
            .groups
            .iter()
            .map(|group| match group {
                ShaderGroup::RayGeneration(shader) | ShaderGroup::Miss(shader) => {
                    vk::RayTracingShaderGroupCreateInfoKHR::builder()
                        .ty(vk::RayTracingShaderGroupTypeKHR::GENERAL)
                        .general_shader(add_stage(shader))
                        .closest_hit_shader(vk::SHADER_UNUSED_KHR)
                        .any_hit_shader(vk::SHADER_UNUSED_KHR)
                        .intersection_shader(vk::SHADER_UNUSED_KHR)
                        .build()
                }
                ShaderGroup::TriangleHit {
                    closest_hit,
                    any_hit,
                } => {
                    let closest_hit = closest_hit
                        .as_ref()
                        .map_or(vk::SHADER_UNUSED_KHR, &mut add_stage);
                    let any_hit = any_hit
                        .as_ref()
                        .map_or(vk::SHADER_UNUSED_KHR, &mut add_stage);

                    vk::RayTracingShaderGroupCreateInfoKHR::builder()
                        .ty(vk::RayTracingShaderGroupTypeKHR::TRIANGLES_HIT_GROUP)
                        .general_shader(vk::SHADER_UNUSED_KHR)
                        .closest_hit_shader(closest_hit)
                        .any_hit_shader(any_hit)
                        .intersection_shader(vk::SHADER_UNUSED_KHR)
                        .build()
                }
            })
            .collect();

        PipelineShaders { stages, groups }
    }
}

pub struct PipelineShaders {
    pub stages: Vec<(CString, vk::ShaderStageFlags, ShaderEntryPoint)>,
    pub groups: Vec<vk::RayTracingShaderGroupCreateInfoKHR>,
}
