use super::{
    derive_state, OptionsUi, PassState, RenderPass, DIFFUSE_COLOR, MAX_ANISOTROPY,
    SPECULAR_COLOR, WORLD_NORMAL, WORLD_POSITION,
};
use crate::{
    backend::{RayTracingBackend, SamplerDesc},
    config::DiffuseGiConfig,
    error::{CompileError, RenderError, Result},
    launch::{DispatchStatus, RayLaunch, RenderContext},
    program::RayProgramBuilder,
    registry::{ResourceRegistry, ENVIRONMENT_MAP_KEY, OUTPUT_CHANNEL_KEY},
};
use glam::Vec4;
use std::sync::Arc;

const RAY_GEN: &str = "DiffuseGIRayGen";
const SHADOW_MISS: &str = "ShadowMiss";
const SHADOW_ANY_HIT: &str = "ShadowHit";
const GI_MISS: &str = "GIMiss";
const GI_CLOSEST_HIT: &str = "GIClosestHit";
const GI_ANY_HIT: &str = "GIAnyHit";

pub const INITIAL_FRAME_COUNT: u32 = 0xdeadbeef;

/// Shades the G-buffer with one shadow ray and one indirect bounce per pixel.
pub struct DiffuseGiPass<B: RayTracingBackend> {
    registry: Arc<ResourceRegistry<B>>,
    config: DiffuseGiConfig,
    output_key: String,
    launch: Option<RayLaunch<B>>,
    scene: Option<Arc<B::Scene>>,
    sampler: Option<B::Sampler>,
    frame_count: u32,
}

impl<B: RayTracingBackend> DiffuseGiPass<B> {
    pub fn new(registry: Arc<ResourceRegistry<B>>, config: DiffuseGiConfig) -> Self {
        let output_key = config
            .output_key
            .clone()
            .unwrap_or_else(|| OUTPUT_CHANNEL_KEY.to_string());
        Self {
            registry,
            config,
            output_key,
            launch: None,
            scene: None,
            sampler: None,
            frame_count: INITIAL_FRAME_COUNT,
        }
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// Value the next dispatch will receive as `gFrameCount`.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    pub fn shadow_rays(&self) -> bool {
        self.config.shadow_rays
    }

    pub fn gi_rays(&self) -> bool {
        self.config.gi_rays
    }

    pub fn set_shadow_rays(&mut self, enabled: bool) {
        self.config.shadow_rays = enabled;
    }

    pub fn set_gi_rays(&mut self, enabled: bool) {
        self.config.gi_rays = enabled;
    }
}

impl<B: RayTracingBackend> RenderPass<B> for DiffuseGiPass<B> {
    fn name(&self) -> &str {
        "Diffuse GI"
    }

    fn options_group(&self) -> &str {
        "Diffuse GI Options"
    }

    fn state(&self) -> PassState {
        derive_state(
            self.launch.is_some(),
            self.scene.is_some(),
            self.launch.as_ref().is_some_and(RayLaunch::ready_to_render),
        )
    }

    fn initialize(&mut self) -> Result<()> {
        if self.launch.is_some() {
            return Err(RenderError::ProgramAlreadyCompiled);
        }

        self.registry.declare_textures([
            WORLD_POSITION,
            WORLD_NORMAL,
            DIFFUSE_COLOR,
            SPECULAR_COLOR,
            ENVIRONMENT_MAP_KEY,
            self.output_key.as_str(),
        ]);
        self.registry.declare_writer(&self.output_key, self.name())?;

        let source = self.config.shader_source.as_str();
        let mut builder = RayProgramBuilder::new(source, RAY_GEN)?;
        builder.add_miss(source, SHADOW_MISS);
        builder.add_hit_group(source, "", SHADOW_ANY_HIT)?;
        builder.add_miss(source, GI_MISS);
        builder.add_hit_group(source, GI_CLOSEST_HIT, GI_ANY_HIT)?;

        self.sampler = Some(
            self.registry
                .backend()
                .create_sampler(&SamplerDesc::trilinear(MAX_ANISOTROPY))?,
        );

        let mut launch = RayLaunch::new(self.registry.backend().clone(), builder.build());
        if let Some(scene) = &self.scene {
            launch.set_scene(scene.clone());
        }
        let compiled = launch.compile();
        self.launch = Some(launch);
        compiled
    }

    fn init_scene(&mut self, scene: Arc<B::Scene>) {
        if let Some(launch) = &mut self.launch {
            launch.set_scene(scene.clone());
        }
        self.scene = Some(scene);
    }

    fn execute(&mut self, ctx: &mut RenderContext) -> Result<DispatchStatus> {
        // The output is cleared even on frames that end up not dispatching.
        let output = self.registry.fetch_cleared(&self.output_key, Vec4::ZERO)?;

        let Some(output) = output else {
            return Ok(DispatchStatus::Skipped);
        };
        let Some(launch) = self.launch.as_mut().filter(|launch| launch.ready_to_render()) else {
            return Ok(DispatchStatus::Skipped);
        };

        let frame_count = self.frame_count;
        self.frame_count = self.frame_count.wrapping_add(1);

        let ray_gen = launch.ray_gen_vars();
        ray_gen.set("gMinT", self.registry.min_t_distance());
        ray_gen.set("gFrameCount", frame_count);
        ray_gen.set("gShadows", self.config.shadow_rays);
        ray_gen.set("gGI", self.config.gi_rays);
        for (name, key) in [
            ("gWorldPos", WORLD_POSITION),
            ("gWorldNorm", WORLD_NORMAL),
            ("gDiffuseCol", DIFFUSE_COLOR),
            ("gSpecCol", SPECULAR_COLOR),
        ] {
            if let Some(texture) = self.registry.fetch(key)? {
                ray_gen.set_texture(name, texture);
            }
        }
        ray_gen.set_texture("gOutput", output);

        let miss = launch.miss_vars(1)?;
        if let Some(environment_map) = self.registry.fetch(ENVIRONMENT_MAP_KEY)? {
            miss.set_texture("gEnvMap", environment_map);
        }
        if let Some(sampler) = &self.sampler {
            miss.set_sampler("gEnvSampler", sampler.clone());
        }

        launch.execute(ctx, self.registry.screen_extent())
    }

    fn render_options(&mut self, ui: &mut dyn OptionsUi) -> bool {
        let group = self.options_group().to_string();
        let mut dirty = false;
        dirty |= ui.checkbox(&group, "Shadow Rays", &mut self.config.shadow_rays);
        dirty |= ui.checkbox(&group, "GI Rays", &mut self.config.gi_rays);
        dirty
    }

    fn compile_error(&self) -> Option<&CompileError> {
        self.launch.as_ref().and_then(RayLaunch::compile_error)
    }

    fn uses_environment_map(&self) -> bool {
        true
    }
}
