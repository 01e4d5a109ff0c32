//! A backend that executes nothing and remembers everything.
//!
//! Textures live in host memory, so clears and read-backs behave exactly as
//! on a device. Recent dispatches are kept together with a snapshot of the
//! variable table as it was when each dispatch was issued.

use crate::{
    backend::{
        Extent2D, ParameterSet, ProgramReflection, RayTracingBackend, RayTracingScene,
        SamplerDesc, TextureDesc, Variables,
    },
    error::{CompileError, RenderError, Result},
    program::{RayProgramDesc, ShaderEntry},
    variables::VariableTable,
};
use glam::Vec4;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, VecDeque},
    path::Path,
    sync::Arc,
};

/// Dispatch records kept before the oldest is discarded.
pub const DISPATCH_HISTORY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SamplerHandle(usize);

/// Entry points and their parameters, per shader source.
#[derive(Debug, Clone, Default)]
pub struct ShaderCatalogue {
    sources: BTreeMap<String, BTreeMap<String, ParameterSet>>,
}

impl ShaderCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: &str, entries: &[(&str, &[&str])]) -> Self {
        let source = self.sources.entry(source.to_string()).or_default();
        for (entry, parameters) in entries {
            source.insert(entry.to_string(), ParameterSet::new(parameters.iter().copied()));
        }
        self
    }

    /// The G-buffer and diffuse GI shader sources.
    pub fn standard() -> Self {
        Self::new()
            .with_source(
                "rtGBuffer",
                &[
                    ("GBufferRayGen", &["gPixelJitter", "gMinT"][..]),
                    ("PrimaryMiss", &["gEnvMap", "gEnvSampler", "gMatDif"][..]),
                    (
                        "PrimaryClosestHit",
                        &["gWsPos", "gWsNorm", "gMatDif", "gMatSpec"][..],
                    ),
                    ("PrimaryAnyHit", &[][..]),
                ],
            )
            .with_source(
                "rtDiffuseGI",
                &[
                    (
                        "DiffuseGIRayGen",
                        &[
                            "gMinT",
                            "gFrameCount",
                            "gShadows",
                            "gGI",
                            "gWorldPos",
                            "gWorldNorm",
                            "gDiffuseCol",
                            "gSpecCol",
                            "gOutput",
                        ][..],
                    ),
                    ("ShadowMiss", &[][..]),
                    ("ShadowHit", &[][..]),
                    ("GIMiss", &["gEnvMap", "gEnvSampler"][..]),
                    ("GIClosestHit", &[][..]),
                    ("GIAnyHit", &[][..]),
                ],
            )
    }

    fn resolve(&self, entry: &ShaderEntry) -> std::result::Result<&ParameterSet, CompileError> {
        let source = self.sources.get(&entry.source).ok_or_else(|| {
            CompileError::new(entry.source.as_str(), "shader source not found")
        })?;
        source.get(&entry.entry).ok_or_else(|| {
            CompileError::new(
                entry.source.as_str(),
                format!("entry point `{}` not found", entry.entry),
            )
        })
    }

    fn reflect(&self, desc: &RayProgramDesc) -> std::result::Result<ProgramReflection, CompileError> {
        let ray_gen = self.resolve(&desc.ray_gen)?.clone();
        let miss = desc
            .miss
            .iter()
            .map(|entry| self.resolve(entry).cloned())
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut hit_groups = Vec::with_capacity(desc.hit_groups.len());
        for group in &desc.hit_groups {
            let mut declared = ParameterSet::default();
            for entry in group.entries() {
                declared.extend(self.resolve(&ShaderEntry::new(&group.source, entry))?);
            }
            hit_groups.push(declared);
        }

        Ok(ProgramReflection {
            ray_gen,
            miss,
            hit_groups,
        })
    }
}

/// A scene where every hit group shades the same number of instances.
#[derive(Debug, Clone)]
pub struct RecordingScene {
    name: String,
    instances: usize,
}

impl RecordingScene {
    pub fn new(name: &str, instances: usize) -> Self {
        Self {
            name: name.to_string(),
            instances,
        }
    }
}

impl RayTracingScene for RecordingScene {
    fn name(&self) -> &str {
        &self.name
    }

    fn hit_group_instance_count(&self, _slot: usize) -> usize {
        self.instances
    }
}

pub struct RecordedProgram {
    desc: RayProgramDesc,
}

#[derive(Debug, Clone)]
pub struct DispatchRecord {
    pub ray_gen: ShaderEntry,
    pub scene: String,
    pub extent: Extent2D,
    pub variables: VariableTable<TextureHandle, SamplerHandle>,
}

struct RecordedTexture {
    name: String,
    extent: Extent2D,
    texels: Vec<Vec4>,
}

#[derive(Default)]
struct RecordingState {
    textures: BTreeMap<usize, RecordedTexture>,
    next_texture: usize,
    samplers: Vec<SamplerDesc>,
    dispatches: VecDeque<DispatchRecord>,
    dispatch_count: usize,
}

#[derive(Clone)]
pub struct RecordingBackend {
    catalogue: Arc<ShaderCatalogue>,
    state: Arc<Mutex<RecordingState>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::with_catalogue(ShaderCatalogue::standard())
    }

    pub fn with_catalogue(catalogue: ShaderCatalogue) -> Self {
        Self {
            catalogue: Arc::new(catalogue),
            state: Arc::new(Mutex::new(RecordingState::default())),
        }
    }

    fn allocate(&self, name: String, extent: Extent2D, fill: Vec4) -> TextureHandle {
        let mut state = self.state.lock();
        let id = state.next_texture;
        state.next_texture += 1;
        state.textures.insert(
            id,
            RecordedTexture {
                name,
                extent,
                texels: vec![fill; extent.texel_count()],
            },
        );
        TextureHandle(id)
    }

    /// Textures still holding texels.
    pub fn texture_count(&self) -> usize {
        self.state.lock().textures.len()
    }

    pub fn texture_extent(&self, texture: &TextureHandle) -> Option<Extent2D> {
        self.state.lock().textures.get(&texture.0).map(|t| t.extent)
    }

    pub fn texture_name(&self, texture: &TextureHandle) -> Option<String> {
        self.state.lock().textures.get(&texture.0).map(|t| t.name.clone())
    }

    pub fn samplers(&self) -> Vec<SamplerDesc> {
        self.state.lock().samplers.clone()
    }

    /// The most recent dispatches, oldest first, at most [`DISPATCH_HISTORY`].
    pub fn dispatches(&self) -> Vec<DispatchRecord> {
        self.state.lock().dispatches.iter().cloned().collect()
    }

    /// As [`Self::dispatches`], emptying the history.
    pub fn take_dispatches(&self) -> Vec<DispatchRecord> {
        self.state.lock().dispatches.drain(..).collect()
    }

    /// Dispatches issued over the backend's lifetime, including discarded ones.
    pub fn dispatch_count(&self) -> usize {
        self.state.lock().dispatch_count
    }
}

impl RayTracingBackend for RecordingBackend {
    type Texture = TextureHandle;
    type Sampler = SamplerHandle;
    type Scene = RecordingScene;
    type Program = RecordedProgram;

    fn create_texture(&self, desc: &TextureDesc) -> Result<TextureHandle> {
        Ok(self.allocate(desc.name.clone(), desc.extent, Vec4::ZERO))
    }

    fn clear_texture(&self, texture: &TextureHandle, color: Vec4) -> Result<()> {
        let mut state = self.state.lock();
        let texture = state
            .textures
            .get_mut(&texture.0)
            .ok_or_else(|| RenderError::Backend(format!("unknown texture {:?}", texture)))?;
        texture.texels.fill(color);
        Ok(())
    }

    fn read_texture(&self, texture: &TextureHandle) -> Result<Vec<Vec4>> {
        self.state
            .lock()
            .textures
            .get(&texture.0)
            .map(|t| t.texels.clone())
            .ok_or_else(|| RenderError::Backend(format!("unknown texture {:?}", texture)))
    }

    fn load_environment_map(&self, path: &Path) -> Result<TextureHandle> {
        Ok(self.allocate(path.display().to_string(), Extent2D::new(2, 1), Vec4::ONE))
    }

    fn release_texture(&self, texture: &TextureHandle) {
        self.state.lock().textures.remove(&texture.0);
    }

    fn create_sampler(&self, desc: &SamplerDesc) -> Result<SamplerHandle> {
        let mut state = self.state.lock();
        state.samplers.push(*desc);
        Ok(SamplerHandle(state.samplers.len() - 1))
    }

    fn compile_program(&self, desc: &RayProgramDesc) -> Result<(RecordedProgram, ProgramReflection)> {
        let reflection = self.catalogue.reflect(desc)?;
        Ok((RecordedProgram { desc: desc.clone() }, reflection))
    }

    fn dispatch(
        &self,
        program: &RecordedProgram,
        scene: &Arc<RecordingScene>,
        variables: &Variables<Self>,
        extent: Extent2D,
    ) -> Result<()> {
        log::trace!(
            "Recording dispatch of {} over {}x{}",
            program.desc.ray_gen.entry,
            extent.width,
            extent.height
        );
        let mut state = self.state.lock();
        if state.dispatches.len() == DISPATCH_HISTORY {
            state.dispatches.pop_front();
        }
        state.dispatches.push_back(DispatchRecord {
            ray_gen: program.desc.ray_gen.clone(),
            scene: scene.name().to_string(),
            extent,
            variables: variables.clone(),
        });
        state.dispatch_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::program::RayProgramBuilder;

    #[test]
    fn clears_reach_every_texel() {
        let backend = RecordingBackend::new();
        let texture = backend
            .create_texture(&TextureDesc {
                name: "WorldPosition".into(),
                extent: Extent2D::new(3, 2),
                format: crate::backend::TextureFormat::Rgba32Float,
            })
            .unwrap();
        backend.clear_texture(&texture, Vec4::new(0.25, 0.5, 0.75, 1.0)).unwrap();
        let texels = backend.read_texture(&texture).unwrap();
        assert_eq!(texels.len(), 6);
        assert!(texels.iter().all(|t| *t == Vec4::new(0.25, 0.5, 0.75, 1.0)));
    }

    #[test]
    fn released_textures_free_their_texels() {
        let backend = RecordingBackend::new();
        let kept = backend.load_environment_map(Path::new("Sky.hdr")).unwrap();
        let released = backend.load_environment_map(Path::new("Sky.hdr")).unwrap();
        backend.release_texture(&released);

        assert_eq!(backend.texture_count(), 1);
        assert!(backend.read_texture(&released).is_err());
        assert_eq!(backend.read_texture(&kept).unwrap().len(), 2);
        let replacement = backend.load_environment_map(Path::new("Sky.hdr")).unwrap();
        assert_ne!(replacement, released);
    }

    #[test]
    fn dispatch_history_is_bounded() {
        let backend = RecordingBackend::new();
        let desc = RayProgramBuilder::new("rtGBuffer", "GBufferRayGen")
            .unwrap()
            .build();
        let (program, reflection) = backend.compile_program(&desc).unwrap();
        let variables = VariableTable::new(reflection);
        let scene = Arc::new(RecordingScene::new("scene", 1));

        for width in 1..=DISPATCH_HISTORY + 10 {
            let extent = Extent2D::new(width as u32, 1);
            backend.dispatch(&program, &scene, &variables, extent).unwrap();
        }
        assert_eq!(backend.dispatch_count(), DISPATCH_HISTORY + 10);

        let history = backend.take_dispatches();
        assert_eq!(history.len(), DISPATCH_HISTORY);
        assert_eq!(history[0].extent, Extent2D::new(11, 1));
        assert!(backend.dispatches().is_empty());
        assert_eq!(backend.dispatch_count(), DISPATCH_HISTORY + 10);
    }

    #[test]
    fn hit_group_reflection_merges_both_stages() {
        let catalogue = ShaderCatalogue::new().with_source(
            "rt",
            &[("Gen", &[][..]), ("Closest", &["a"][..]), ("Any", &["b"][..])],
        );
        let mut builder = RayProgramBuilder::new("rt", "Gen").unwrap();
        builder.add_hit_group("rt", "Closest", "Any").unwrap();
        let reflection = catalogue.reflect(&builder.build()).unwrap();
        assert!(reflection.hit_groups[0].contains("a"));
        assert!(reflection.hit_groups[0].contains("b"));
    }

    #[test]
    fn unknown_sources_fail_to_compile() {
        let backend = RecordingBackend::new();
        let desc = RayProgramBuilder::new("rtMissing", "Gen").unwrap().build();
        let err = backend.compile_program(&desc).err().unwrap();
        assert!(matches!(err, RenderError::Compile(ref e) if e.source_id == "rtMissing"));
    }
}
