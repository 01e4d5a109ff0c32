use crate::{
    backend::{Extent2D, RayTracingBackend, TextureDesc, TextureFormat},
    error::{RenderError, Result},
};
use glam::Vec4;
use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

pub const ENVIRONMENT_MAP_KEY: &str = "__EnvironmentMap";
pub const OUTPUT_CHANNEL_KEY: &str = "__OutputChannel";

pub const DEFAULT_MIN_T_DISTANCE: f32 = 1.0e-4;

/// Loaded for [`ENVIRONMENT_MAP_KEY`] until a pass names another image.
pub const DEFAULT_ENVIRONMENT_MAP: &str = "MonValley_G_DirtRoad_3k.hdr";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClearPolicy {
    #[default]
    OnRequest,
    /// Contents carry over between frames, so the texture may only be fetched without clearing.
    Accumulate,
}

#[derive(Debug, Clone)]
pub struct NamedResource<T> {
    pub key: String,
    pub format: TextureFormat,
    pub texture: Option<T>,
    pub clear_policy: ClearPolicy,
}

impl<T> NamedResource<T> {
    fn new(key: &str, clear_policy: ClearPolicy) -> Self {
        Self {
            key: key.to_string(),
            format: TextureFormat::Rgba32Float,
            texture: None,
            clear_policy,
        }
    }
}

struct RegistryState<T> {
    extent: Extent2D,
    resources: BTreeMap<String, NamedResource<T>>,
    environment_map: Option<PathBuf>,
    default_scene: Option<String>,
    writers: BTreeMap<String, Vec<String>>,
}

/// Named textures shared between the passes of one pipeline.
///
/// Storage is allocated lazily at the current screen extent the first time a
/// key is fetched, and dropped again whenever the extent changes.
pub struct ResourceRegistry<B: RayTracingBackend> {
    backend: B,
    min_t_distance: f32,
    state: Mutex<RegistryState<B::Texture>>,
}

impl<B: RayTracingBackend> ResourceRegistry<B> {
    pub fn new(backend: B, extent: Extent2D, min_t_distance: f32) -> Self {
        Self {
            backend,
            min_t_distance,
            state: Mutex::new(RegistryState {
                extent,
                resources: BTreeMap::new(),
                environment_map: None,
                default_scene: None,
                writers: BTreeMap::new(),
            }),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn declare_texture(&self, key: &str) {
        self.declare(key, ClearPolicy::OnRequest);
    }

    pub fn declare_textures<I, K>(&self, keys: I)
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        for key in keys {
            self.declare_texture(key.as_ref());
        }
    }

    pub fn declare_accumulation_texture(&self, key: &str) {
        let mut state = self.state.lock();
        state
            .resources
            .entry(key.to_string())
            .or_insert_with(|| NamedResource::new(key, ClearPolicy::Accumulate))
            .clear_policy = ClearPolicy::Accumulate;
    }

    fn declare(&self, key: &str, clear_policy: ClearPolicy) {
        let mut state = self.state.lock();
        if !state.resources.contains_key(key) {
            log::debug!("Declaring resource {}", key);
            state
                .resources
                .insert(key.to_string(), NamedResource::new(key, clear_policy));
        }
    }

    pub fn declare_environment_map(&self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut state = self.state.lock();
        let resource = state
            .resources
            .entry(ENVIRONMENT_MAP_KEY.to_string())
            .or_insert_with(|| NamedResource::new(ENVIRONMENT_MAP_KEY, ClearPolicy::OnRequest));
        if let Some(texture) = resource.texture.take() {
            self.backend.release_texture(&texture);
        }
        log::debug!("Environment map set to {}", path.display());
        state.environment_map = Some(path);
    }

    pub fn environment_map_path(&self) -> PathBuf {
        self.state
            .lock()
            .environment_map
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ENVIRONMENT_MAP))
    }

    pub fn declare_output_channel(&self) -> &'static str {
        self.declare_texture(OUTPUT_CHANNEL_KEY);
        OUTPUT_CHANNEL_KEY
    }

    pub fn declare_default_scene(&self, path: &str) {
        self.state.lock().default_scene = Some(path.to_string());
    }

    pub fn default_scene(&self) -> Option<String> {
        self.state.lock().default_scene.clone()
    }

    pub fn is_declared(&self, key: &str) -> bool {
        self.state.lock().resources.contains_key(key)
    }

    pub fn clear_policy(&self, key: &str) -> Option<ClearPolicy> {
        self.state
            .lock()
            .resources
            .get(key)
            .map(|resource| resource.clear_policy)
    }

    /// Backing storage for `key`, allocated on first use. `Ok(None)` means the
    /// storage cannot exist yet because the screen has no area.
    pub fn fetch(&self, key: &str) -> Result<Option<B::Texture>> {
        let environment_map = self.environment_map_path();
        let mut state = self.state.lock();
        let extent = state.extent;
        let resource = state
            .resources
            .get_mut(key)
            .ok_or_else(|| RenderError::UnregisteredResource(key.to_string()))?;

        if let Some(texture) = &resource.texture {
            return Ok(Some(texture.clone()));
        }

        let texture = if key == ENVIRONMENT_MAP_KEY {
            self.backend.load_environment_map(&environment_map)?
        } else {
            if extent.is_empty() {
                return Ok(None);
            }
            self.backend.create_texture(&TextureDesc {
                name: resource.key.clone(),
                extent,
                format: resource.format,
            })?
        };

        resource.texture = Some(texture.clone());
        Ok(Some(texture))
    }

    /// As [`Self::fetch`], then every texel is reset to `color`.
    pub fn fetch_cleared(&self, key: &str, color: Vec4) -> Result<Option<B::Texture>> {
        if self.clear_policy(key) == Some(ClearPolicy::Accumulate) {
            return Err(RenderError::ClearOfAccumulationTexture(key.to_string()));
        }

        let texture = self.fetch(key)?;
        if let Some(texture) = &texture {
            self.backend.clear_texture(texture, color)?;
        }
        Ok(texture)
    }

    pub fn read_texels(&self, key: &str) -> Result<Option<Vec<Vec4>>> {
        match self.fetch(key)? {
            Some(texture) => Ok(Some(self.backend.read_texture(&texture)?)),
            None => Ok(None),
        }
    }

    pub fn screen_extent(&self) -> Extent2D {
        self.state.lock().extent
    }

    pub fn resize(&self, extent: Extent2D) {
        let mut state = self.state.lock();
        if state.extent == extent {
            return;
        }

        log::debug!(
            "Resizing resources from {}x{} to {}x{}",
            state.extent.width,
            state.extent.height,
            extent.width,
            extent.height
        );
        state.extent = extent;
        for (key, resource) in state.resources.iter_mut() {
            if key == ENVIRONMENT_MAP_KEY {
                continue;
            }
            if let Some(texture) = resource.texture.take() {
                self.backend.release_texture(&texture);
            }
        }
    }

    pub fn min_t_distance(&self) -> f32 {
        self.min_t_distance
    }

    /// Records that `pass` intends to write `key` every frame. Every call
    /// counts as a separate writer, so two instances of one pass sharing an
    /// output are reported too.
    pub fn declare_writer(&self, key: &str, pass: &str) -> Result<()> {
        let mut state = self.state.lock();
        if !state.resources.contains_key(key) {
            return Err(RenderError::UnregisteredResource(key.to_string()));
        }

        let writers = state.writers.entry(key.to_string()).or_default();
        writers.push(pass.to_string());
        if writers.len() > 1 {
            log::warn!("Resource {} is written by several passes: {:?}", key, writers);
        }
        Ok(())
    }

    /// Keys with more than one declared writer, for review by the host.
    pub fn shared_writers(&self) -> Vec<(String, Vec<String>)> {
        self.state
            .lock()
            .writers
            .iter()
            .filter(|(_, writers)| writers.len() > 1)
            .map(|(key, writers)| (key.clone(), writers.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingBackend;

    fn registry() -> ResourceRegistry<RecordingBackend> {
        ResourceRegistry::new(
            RecordingBackend::new(),
            Extent2D::new(4, 3),
            DEFAULT_MIN_T_DISTANCE,
        )
    }

    #[test]
    fn unregistered_fetch_is_a_configuration_fault() {
        let registry = registry();
        let err = registry.fetch("UnregisteredKey").unwrap_err();
        assert!(matches!(err, RenderError::UnregisteredResource(ref key) if key == "UnregisteredKey"));
        assert!(err.is_configuration_fault());
    }

    #[test]
    fn declaring_twice_keeps_the_allocation() {
        let registry = registry();
        registry.declare_texture("WorldPosition");
        let first = registry.fetch("WorldPosition").unwrap().unwrap();
        registry.declare_textures(["WorldPosition", "WorldNormal"]);
        let second = registry.fetch("WorldPosition").unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.backend().texture_count(), 1);
    }

    #[test]
    fn fetch_is_lazy_and_sized_to_the_screen() {
        let registry = registry();
        registry.declare_texture("DiffuseColor");
        assert_eq!(registry.backend().texture_count(), 0);

        let texture = registry.fetch("DiffuseColor").unwrap().unwrap();
        assert_eq!(registry.backend().texture_extent(&texture), Some(Extent2D::new(4, 3)));
    }

    #[test]
    fn fetch_without_area_is_not_an_error() {
        let registry = registry();
        registry.declare_texture("DiffuseColor");
        registry.resize(Extent2D::new(0, 0));
        assert!(registry.fetch("DiffuseColor").unwrap().is_none());
        assert!(registry.fetch_cleared("DiffuseColor", Vec4::ONE).unwrap().is_none());
    }

    #[test]
    fn resize_reallocates_at_the_new_extent() {
        let registry = registry();
        registry.declare_texture("WorldNormal");
        let before = registry.fetch("WorldNormal").unwrap().unwrap();
        registry.resize(Extent2D::new(8, 8));
        let after = registry.fetch("WorldNormal").unwrap().unwrap();
        assert_ne!(before, after);
        assert_eq!(registry.backend().texture_extent(&after), Some(Extent2D::new(8, 8)));
        assert_eq!(registry.backend().texture_extent(&before), None);
    }

    #[test]
    fn repeated_resizes_keep_one_allocation_per_key() {
        let registry = registry();
        registry.declare_textures(["WorldNormal", "WorldPosition"]);
        registry.declare_environment_map("Sunset.hdr");
        for size in 1..=10 {
            registry.resize(Extent2D::new(size, size));
            registry.fetch("WorldNormal").unwrap();
            registry.fetch("WorldPosition").unwrap();
            registry.fetch(ENVIRONMENT_MAP_KEY).unwrap();
            registry.declare_environment_map("Sunset.hdr");
        }
        assert_eq!(registry.backend().texture_count(), 2);
    }

    #[test]
    fn accumulation_textures_refuse_to_clear() {
        let registry = registry();
        registry.declare_accumulation_texture("History");
        assert!(registry.fetch("History").unwrap().is_some());
        let err = registry.fetch_cleared("History", Vec4::ZERO).unwrap_err();
        assert!(matches!(err, RenderError::ClearOfAccumulationTexture(_)));
    }

    #[test]
    fn undeclared_environment_map_falls_back_to_the_default() {
        let registry = registry();
        registry.declare_texture(ENVIRONMENT_MAP_KEY);
        assert_eq!(
            registry.environment_map_path(),
            PathBuf::from(DEFAULT_ENVIRONMENT_MAP)
        );

        let texture = registry.fetch(ENVIRONMENT_MAP_KEY).unwrap().unwrap();
        assert_eq!(
            registry.backend().texture_name(&texture).as_deref(),
            Some(DEFAULT_ENVIRONMENT_MAP)
        );
    }

    #[test]
    fn environment_map_loads_from_its_path() {
        let registry = registry();
        registry.declare_environment_map("Sunset.hdr");
        assert_eq!(registry.environment_map_path(), PathBuf::from("Sunset.hdr"));
        let first = registry.fetch(ENVIRONMENT_MAP_KEY).unwrap().unwrap();
        registry.resize(Extent2D::new(16, 16));
        assert_eq!(registry.fetch(ENVIRONMENT_MAP_KEY).unwrap(), Some(first.clone()));

        registry.declare_environment_map("Other.hdr");
        assert_ne!(registry.fetch(ENVIRONMENT_MAP_KEY).unwrap(), Some(first));
    }

    #[test]
    fn second_writer_is_reported() {
        let registry = registry();
        let output = registry.declare_output_channel();
        registry.declare_writer(output, "Diffuse GI").unwrap();
        assert!(registry.shared_writers().is_empty());

        registry.declare_writer(output, "Tone Mapping").unwrap();
        assert_eq!(
            registry.shared_writers(),
            vec![(
                OUTPUT_CHANNEL_KEY.to_string(),
                vec!["Diffuse GI".to_string(), "Tone Mapping".to_string()]
            )]
        );
        assert!(registry.declare_writer("Missing", "Diffuse GI").is_err());
    }

    #[test]
    fn default_scene_is_opaque() {
        let registry = registry();
        assert_eq!(registry.default_scene(), None);
        registry.declare_default_scene("DXRBasic/BasicScene.fscene");
        assert_eq!(registry.default_scene().as_deref(), Some("DXRBasic/BasicScene.fscene"));
    }
}
