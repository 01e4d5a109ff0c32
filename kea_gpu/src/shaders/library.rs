use super::{EntryPointManifest, ShaderEntryPoint, ShaderManifest, ShaderModule};
use crate::{device::Device, GpuError, Result};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// One compiled SPIR-V library and its manifest.
pub struct ShaderSource {
    id: String,
    module: Arc<ShaderModule>,
    manifest: ShaderManifest,
}

impl ShaderSource {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn manifest(&self) -> &ShaderManifest {
        &self.manifest
    }

    pub fn entry_point(&self, name: &str) -> Option<(ShaderEntryPoint, &EntryPointManifest)> {
        let manifest = self.manifest.entry_point(name)?;
        Some((self.module.entry_point(name, manifest.stage), manifest))
    }
}

/// Loads shader sources by identifier from a directory, caching each one.
pub struct ShaderLibrary {
    device: Arc<Device>,
    directory: PathBuf,
    sources: Mutex<HashMap<String, Arc<ShaderSource>>>,
}

impl ShaderLibrary {
    pub fn new(device: Arc<Device>, directory: impl Into<PathBuf>) -> Self {
        Self {
            device,
            directory: directory.into(),
            sources: Mutex::new(HashMap::new()),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn load(&self, source_id: &str) -> Result<Arc<ShaderSource>> {
        if let Some(source) = self.sources.lock().get(source_id) {
            return Ok(source.clone());
        }

        let spv_path = self.directory.join(format!("{}.spv", source_id));
        let manifest_path = self.directory.join(format!("{}.json", source_id));

        let manifest_json = fs::read_to_string(&manifest_path).map_err(|err| {
            GpuError::ShaderLibrary {
                source_id: source_id.to_string(),
                reason: format!("cannot read {}: {}", manifest_path.display(), err),
            }
        })?;
        let manifest = ShaderManifest::from_json(&manifest_json)?;

        if !spv_path.exists() {
            return Err(GpuError::ShaderLibrary {
                source_id: source_id.to_string(),
                reason: format!("{} does not exist", spv_path.display()),
            });
        }
        let module = ShaderModule::from_file(self.device.clone(), &spv_path)?;

        log::info!(
            "Loaded shader library {} with {} entry points",
            source_id,
            manifest.entry_points.len()
        );

        let source = Arc::new(ShaderSource {
            id: source_id.to_string(),
            module,
            manifest,
        });
        self.sources
            .lock()
            .insert(source_id.to_string(), source.clone());

        Ok(source)
    }
}
