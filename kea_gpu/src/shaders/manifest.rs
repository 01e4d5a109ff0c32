//! Reflection data shipped next to each compiled SPIR-V library.
//!
//! A library `<id>.spv` is accompanied by `<id>.json` listing the entry
//! points it contains and the parameters each one reads. Resource
//! parameters carry a descriptor `binding` in set 0; plain data parameters
//! carry a byte `offset` into the stage's constant block (push constants for
//! ray generation, shader record data for miss and hit groups).

use ash::vk;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderStage {
    RayGen,
    Miss,
    ClosestHit,
    AnyHit,
    Intersection,
}

impl From<ShaderStage> for vk::ShaderStageFlags {
    fn from(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::RayGen => vk::ShaderStageFlags::RAYGEN_KHR,
            ShaderStage::Miss => vk::ShaderStageFlags::MISS_KHR,
            ShaderStage::ClosestHit => vk::ShaderStageFlags::CLOSEST_HIT_KHR,
            ShaderStage::AnyHit => vk::ShaderStageFlags::ANY_HIT_KHR,
            ShaderStage::Intersection => vk::ShaderStageFlags::INTERSECTION_KHR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    AccelerationStructure,
    StorageImage,
    SampledImage,
    Sampler,
    Bool,
    Uint,
    Int,
    Float,
    Float2,
    Float3,
    Float4,
}

impl ParameterKind {
    pub fn descriptor_type(&self) -> Option<vk::DescriptorType> {
        match self {
            ParameterKind::AccelerationStructure => {
                Some(vk::DescriptorType::ACCELERATION_STRUCTURE_KHR)
            }
            ParameterKind::StorageImage => Some(vk::DescriptorType::STORAGE_IMAGE),
            ParameterKind::SampledImage => Some(vk::DescriptorType::SAMPLED_IMAGE),
            ParameterKind::Sampler => Some(vk::DescriptorType::SAMPLER),
            _ => None,
        }
    }

    /// Size in bytes of a plain data parameter. Booleans occupy a full 32 bit word.
    pub fn constant_size(&self) -> u32 {
        match self {
            ParameterKind::Bool | ParameterKind::Uint | ParameterKind::Int | ParameterKind::Float => {
                4
            }
            ParameterKind::Float2 => 8,
            ParameterKind::Float3 => 12,
            ParameterKind::Float4 => 16,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterManifest {
    pub name: String,
    pub kind: ParameterKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPointManifest {
    pub name: String,
    pub stage: ShaderStage,
    #[serde(default)]
    pub parameters: Vec<ParameterManifest>,
}

impl EntryPointManifest {
    /// Bytes of constant data this entry point reads.
    pub fn constant_block_size(&self) -> u32 {
        self.parameters
            .iter()
            .filter_map(|param| param.offset.map(|offset| offset + param.kind.constant_size()))
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderManifest {
    pub entry_points: Vec<EntryPointManifest>,
}

impl ShaderManifest {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn entry_point(&self, name: &str) -> Option<&EntryPointManifest> {
        self.entry_points.iter().find(|entry| entry.name == name)
    }
}
