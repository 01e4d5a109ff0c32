use crate::{
    backend::Extent2D,
    error::{RenderError, Result},
    registry::{DEFAULT_ENVIRONMENT_MAP, DEFAULT_MIN_T_DISTANCE},
};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    #[default]
    WallClock,
    Fixed(u64),
}

impl SeedSource {
    pub fn seed(&self) -> u64 {
        match self {
            SeedSource::Fixed(seed) => *seed,
            SeedSource::WallClock => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or_default(),
        }
    }
}

/// What the pipeline does with a pass whose program fails to compile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileFaultPolicy {
    Abort,
    #[default]
    DisablePass,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GBufferConfig {
    pub enable_specular_channel: bool,
    pub enable_alpha_test: bool,
    pub environment_map: PathBuf,
    pub default_scene: String,
    pub seed: SeedSource,
    pub shader_source: String,
}

impl Default for GBufferConfig {
    fn default() -> Self {
        Self {
            enable_specular_channel: false,
            enable_alpha_test: false,
            environment_map: PathBuf::from(DEFAULT_ENVIRONMENT_MAP),
            default_scene: "BasicScene".to_string(),
            seed: SeedSource::default(),
            shader_source: "rtGBuffer".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffuseGiConfig {
    pub shadow_rays: bool,
    pub gi_rays: bool,
    /// Defaults to the registry's output channel.
    pub output_key: Option<String>,
    pub shader_source: String,
}

impl Default for DiffuseGiConfig {
    fn default() -> Self {
        Self {
            shadow_rays: true,
            gi_rays: true,
            output_key: None,
            shader_source: "rtDiffuseGI".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub width: u32,
    pub height: u32,
    pub frames: u32,
    pub min_t_distance: f32,
    pub headless: bool,
    pub validation: bool,
    pub shader_dir: PathBuf,
    pub output_image: Option<PathBuf>,
    pub compile_fault_policy: CompileFaultPolicy,
    pub gbuffer: GBufferConfig,
    pub diffuse_gi: DiffuseGiConfig,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frames: 1,
            min_t_distance: DEFAULT_MIN_T_DISTANCE,
            headless: false,
            validation: false,
            shader_dir: PathBuf::from("shaders"),
            output_image: None,
            compile_fault_policy: CompileFaultPolicy::default(),
            gbuffer: GBufferConfig::default(),
            diffuse_gi: DiffuseGiConfig::default(),
        }
    }
}

impl RendererConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        log::info!("Loading configuration from {}", path.display());
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_t_distance.is_finite() && self.min_t_distance >= 0.0) {
            return Err(RenderError::Config(format!(
                "min_t_distance must be a non-negative number, got {}",
                self.min_t_distance
            )));
        }
        if self.gbuffer.shader_source.is_empty() || self.diffuse_gi.shader_source.is_empty() {
            return Err(RenderError::Config("shader_source must not be empty".to_string()));
        }
        if matches!(&self.diffuse_gi.output_key, Some(key) if key.is_empty()) {
            return Err(RenderError::Config("output_key must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn extent(&self) -> Extent2D {
        Extent2D::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = RendererConfig::from_json(
            r#"{ "width": 64, "diffuse_gi": { "shadow_rays": false }, "gbuffer": { "seed": { "fixed": 7 } } }"#,
        )
        .unwrap();
        assert_eq!(config.extent(), Extent2D::new(64, 720));
        assert_eq!(config.min_t_distance, DEFAULT_MIN_T_DISTANCE);
        assert!(!config.diffuse_gi.shadow_rays);
        assert!(config.diffuse_gi.gi_rays);
        assert_eq!(config.gbuffer.seed, SeedSource::Fixed(7));
        assert_eq!(config.compile_fault_policy, CompileFaultPolicy::DisablePass);
    }

    #[test]
    fn rejects_negative_min_t() {
        let err = RendererConfig::from_json(r#"{ "min_t_distance": -1.0 }"#).unwrap_err();
        assert!(matches!(err, RenderError::Config(_)));
    }

    #[test]
    fn wall_clock_seeds_vary_with_time() {
        assert_eq!(SeedSource::Fixed(42).seed(), 42);
        assert_ne!(SeedSource::WallClock.seed(), 0);
    }
}
