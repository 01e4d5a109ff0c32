//! The seam between the pass machinery and whatever executes it.
//!
//! Passes, the registry and the dispatch engine are generic over
//! [`RayTracingBackend`]. The Vulkan adapter runs them on hardware and the
//! recording backend runs them on the CPU for tests and headless runs.

use crate::{
    error::Result,
    program::RayProgramDesc,
    variables::VariableTable,
};
use glam::{Vec2, Vec3, Vec4};
use kea_gpu::storage::images::SamplerFilter;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt::Debug, path::Path, sync::Arc};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Rgba32Float,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextureDesc {
    pub name: String,
    pub extent: Extent2D,
    pub format: TextureFormat,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplerDesc {
    pub min: SamplerFilter,
    pub mag: SamplerFilter,
    pub mip: SamplerFilter,
    pub max_anisotropy: u32,
}

impl SamplerDesc {
    pub fn trilinear(max_anisotropy: u32) -> Self {
        Self {
            min: SamplerFilter::Linear,
            mag: SamplerFilter::Linear,
            mip: SamplerFilter::Linear,
            max_anisotropy,
        }
    }
}

/// A value bound to a shader parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ShaderValue<T, S> {
    Texture(T),
    Sampler(S),
    Bool(bool),
    Uint(u32),
    Int(i32),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
}

impl<T, S> ShaderValue<T, S> {
    pub fn as_texture(&self) -> Option<&T> {
        match self {
            ShaderValue::Texture(texture) => Some(texture),
            _ => None,
        }
    }

    pub fn as_sampler(&self) -> Option<&S> {
        match self {
            ShaderValue::Sampler(sampler) => Some(sampler),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ShaderValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_uint(&self) -> Option<u32> {
        match self {
            ShaderValue::Uint(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            ShaderValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float2(&self) -> Option<Vec2> {
        match self {
            ShaderValue::Float2(value) => Some(*value),
            _ => None,
        }
    }

    /// The little-endian bytes of a plain data value, as laid out in a constant block.
    pub fn constant_bytes(&self) -> Option<Vec<u8>> {
        let bytes = match self {
            ShaderValue::Texture(_) | ShaderValue::Sampler(_) => return None,
            ShaderValue::Bool(value) => (*value as u32).to_le_bytes().to_vec(),
            ShaderValue::Uint(value) => value.to_le_bytes().to_vec(),
            ShaderValue::Int(value) => value.to_le_bytes().to_vec(),
            ShaderValue::Float(value) => value.to_le_bytes().to_vec(),
            ShaderValue::Float2(value) => bytemuck::bytes_of(value).to_vec(),
            ShaderValue::Float3(value) => bytemuck::bytes_of(value).to_vec(),
            ShaderValue::Float4(value) => bytemuck::bytes_of(value).to_vec(),
        };
        Some(bytes)
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<T, S> From<$ty> for ShaderValue<T, S> {
                fn from(value: $ty) -> Self {
                    ShaderValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar!(
    bool => Bool,
    u32 => Uint,
    i32 => Int,
    f32 => Float,
    Vec2 => Float2,
    Vec3 => Float3,
    Vec4 => Float4,
);

/// Names of the parameters one shader scope declares.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet(BTreeSet<String>);

impl ParameterSet {
    pub fn new<I, N>(names: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn extend(&mut self, other: &ParameterSet) {
        self.0.extend(other.0.iter().cloned());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The parameters a compiled program declares, per scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramReflection {
    pub ray_gen: ParameterSet,
    pub miss: Vec<ParameterSet>,
    pub hit_groups: Vec<ParameterSet>,
}

impl ProgramReflection {
    /// Reflection of a program that declares nothing, shaped like `desc`.
    pub fn empty(desc: &RayProgramDesc) -> Self {
        Self {
            ray_gen: ParameterSet::default(),
            miss: vec![ParameterSet::default(); desc.miss.len()],
            hit_groups: vec![ParameterSet::default(); desc.hit_groups.len()],
        }
    }
}

/// A scene prepared for ray tracing.
pub trait RayTracingScene: Send + Sync {
    fn name(&self) -> &str;

    /// Number of geometry instances whose hits are shaded by hit group `slot`.
    fn hit_group_instance_count(&self, slot: usize) -> usize;
}

pub type Value<B> =
    ShaderValue<<B as RayTracingBackend>::Texture, <B as RayTracingBackend>::Sampler>;

pub type Variables<B> =
    VariableTable<<B as RayTracingBackend>::Texture, <B as RayTracingBackend>::Sampler>;

pub trait RayTracingBackend: Clone + Send + Sync + 'static {
    type Texture: Clone + Debug + PartialEq + Send + Sync;
    type Sampler: Clone + Debug + PartialEq + Send + Sync;
    type Scene: RayTracingScene;
    type Program: Send + Sync;

    fn create_texture(&self, desc: &TextureDesc) -> Result<Self::Texture>;

    fn clear_texture(&self, texture: &Self::Texture, color: Vec4) -> Result<()>;

    fn read_texture(&self, texture: &Self::Texture) -> Result<Vec<Vec4>>;

    fn load_environment_map(&self, path: &Path) -> Result<Self::Texture>;

    /// Called once the registry has dropped its handle to `texture`. Backends
    /// whose handles own their storage have nothing to do here.
    fn release_texture(&self, _texture: &Self::Texture) {}

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<Self::Sampler>;

    /// Resolves every entry of `desc` and links them into one program. An
    /// entry that does not resolve yields [`crate::error::RenderError::Compile`].
    fn compile_program(&self, desc: &RayProgramDesc)
        -> Result<(Self::Program, ProgramReflection)>;

    /// Issues one dispatch of `extent.width * extent.height` ray generation
    /// invocations, reading `variables` as they are now.
    fn dispatch(
        &self,
        program: &Self::Program,
        scene: &Arc<Self::Scene>,
        variables: &Variables<Self>,
        extent: Extent2D,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    type Value = ShaderValue<u32, u32>;

    #[test]
    fn scalars_convert_into_values() {
        assert_eq!(Value::from(true), ShaderValue::Bool(true));
        assert_eq!(Value::from(7u32), ShaderValue::Uint(7));
        assert_eq!(Value::from(0.5f32).as_float(), Some(0.5));
        assert_eq!(
            Value::from(Vec2::new(0.25, -0.25)).as_float2(),
            Some(Vec2::new(0.25, -0.25))
        );
    }

    #[test]
    fn constant_bytes_are_little_endian_words() {
        assert_eq!(Value::Bool(true).constant_bytes(), Some(vec![1, 0, 0, 0]));
        assert_eq!(
            Value::Uint(0xdeadbeef).constant_bytes(),
            Some(vec![0xef, 0xbe, 0xad, 0xde])
        );
        assert_eq!(Value::Float3(Vec3::ONE).constant_bytes().map(|b| b.len()), Some(12));
        assert_eq!(Value::Texture(1).constant_bytes(), None);
    }

    #[test]
    fn empty_extents_have_no_texels() {
        assert!(Extent2D::new(0, 720).is_empty());
        assert!(!Extent2D::new(1280, 720).is_empty());
        assert_eq!(Extent2D::new(4, 3).texel_count(), 12);
    }
}
