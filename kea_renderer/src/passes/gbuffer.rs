use super::{
    derive_state, OptionsUi, PassState, RenderPass, DIFFUSE_COLOR, MAX_ANISOTROPY,
    SPECULAR_COLOR, WORLD_NORMAL, WORLD_POSITION,
};
use crate::{
    backend::{RayTracingBackend, SamplerDesc},
    config::GBufferConfig,
    error::{CompileError, RenderError, Result},
    launch::{DispatchStatus, RayLaunch, RenderContext},
    program::RayProgramBuilder,
    registry::{ResourceRegistry, ENVIRONMENT_MAP_KEY},
};
use glam::{Vec2, Vec4};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use std::sync::Arc;

const RAY_GEN: &str = "GBufferRayGen";
const PRIMARY_MISS: &str = "PrimaryMiss";
const PRIMARY_CLOSEST_HIT: &str = "PrimaryClosestHit";
const PRIMARY_ANY_HIT: &str = "PrimaryAnyHit";

/// Casts one jittered primary ray per pixel and writes what it hits into the
/// world position, world normal and material color channels.
pub struct GBufferPass<B: RayTracingBackend> {
    registry: Arc<ResourceRegistry<B>>,
    config: GBufferConfig,
    launch: Option<RayLaunch<B>>,
    scene: Option<Arc<B::Scene>>,
    sampler: Option<B::Sampler>,
    rng: Option<StdRng>,
    jitter_camera: bool,
    last_jitter: Vec2,
}

impl<B: RayTracingBackend> GBufferPass<B> {
    pub fn new(registry: Arc<ResourceRegistry<B>>, config: GBufferConfig) -> Self {
        Self {
            registry,
            config,
            launch: None,
            scene: None,
            sampler: None,
            rng: None,
            jitter_camera: true,
            last_jitter: Vec2::ZERO,
        }
    }

    fn channels(&self) -> Vec<&'static str> {
        let mut channels = vec![WORLD_POSITION, WORLD_NORMAL, DIFFUSE_COLOR];
        if self.config.enable_specular_channel {
            channels.push(SPECULAR_COLOR);
        }
        channels
    }

    /// Sub-pixel offset used by the most recent dispatch, in `[-0.5, 0.5)`.
    pub fn last_jitter(&self) -> Vec2 {
        self.last_jitter
    }

    pub fn jitter_camera(&self) -> bool {
        self.jitter_camera
    }

    fn next_jitter(&mut self) -> Vec2 {
        match (&mut self.rng, self.jitter_camera) {
            (Some(rng), true) => {
                let x = rng.random_range(0.0..1.0f32);
                let y = rng.random_range(0.0..1.0f32);
                Vec2::new(x - 0.5, y - 0.5)
            }
            _ => Vec2::ZERO,
        }
    }
}

impl<B: RayTracingBackend> RenderPass<B> for GBufferPass<B> {
    fn name(&self) -> &str {
        "G-Buffer"
    }

    fn options_group(&self) -> &str {
        "G-Buffer Options"
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

        let channels = self.channels();
        self.registry.declare_textures(&channels);
        for channel in &channels {
            self.registry.declare_writer(channel, self.name())?;
        }
        self.registry
            .declare_environment_map(&self.config.environment_map);
        self.registry
            .declare_default_scene(&self.config.default_scene);

        let source = self.config.shader_source.as_str();
        let any_hit = if self.config.enable_alpha_test {
            PRIMARY_ANY_HIT
        } else {
            ""
        };
        let mut builder = RayProgramBuilder::new(source, RAY_GEN)?.with_max_recursion_depth(1);
        builder.add_miss(source, PRIMARY_MISS);
        builder.add_hit_group(source, PRIMARY_CLOSEST_HIT, any_hit)?;

        self.sampler = Some(
            self.registry
                .backend()
                .create_sampler(&SamplerDesc::trilinear(MAX_ANISOTROPY))?,
        );
        self.rng = Some(StdRng::seed_from_u64(self.config.seed.seed()));

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
        if !self.launch.as_ref().is_some_and(RayLaunch::ready_to_render) {
            return Ok(DispatchStatus::Skipped);
        }

        let mut textures = Vec::new();
        for channel in self.channels() {
            match self.registry.fetch_cleared(channel, Vec4::ZERO)? {
                Some(texture) => textures.push(texture),
                None => return Ok(DispatchStatus::Skipped),
            }
        }
        let environment_map = self.registry.fetch(ENVIRONMENT_MAP_KEY)?;

        let jitter = self.next_jitter();
        self.last_jitter = jitter;

        let min_t = self.registry.min_t_distance();
        let extent = self.registry.screen_extent();
        let sampler = self.sampler.clone();
        let Some(launch) = self.launch.as_mut() else {
            return Ok(DispatchStatus::Skipped);
        };

        let ray_gen = launch.ray_gen_vars();
        ray_gen.set("gPixelJitter", jitter);
        ray_gen.set("gMinT", min_t);

        let miss = launch.miss_vars(0)?;
        if let Some(environment_map) = &environment_map {
            miss.set_texture("gEnvMap", environment_map.clone());
        }
        if let Some(sampler) = &sampler {
            miss.set_sampler("gEnvSampler", sampler.clone());
        }
        miss.set_texture("gMatDif", textures[2].clone());

        for scope in launch.hit_vars(0)? {
            scope.set_texture("gWsPos", textures[0].clone());
            scope.set_texture("gWsNorm", textures[1].clone());
            scope.set_texture("gMatDif", textures[2].clone());
            if let Some(specular) = textures.get(3) {
                scope.set_texture("gMatSpec", specular.clone());
            }
        }

        launch.execute(ctx, extent)
    }

    fn render_options(&mut self, ui: &mut dyn OptionsUi) -> bool {
        let group = self.options_group().to_string();
        ui.checkbox(&group, "Jitter Camera", &mut self.jitter_camera)
    }

    fn compile_error(&self) -> Option<&CompileError> {
        self.launch.as_ref().and_then(RayLaunch::compile_error)
    }

    fn uses_environment_map(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::Extent2D,
        config::SeedSource,
        recording::{RecordingBackend, RecordingScene},
        registry::DEFAULT_MIN_T_DISTANCE,
    };

    fn pass(config: GBufferConfig) -> (RecordingBackend, GBufferPass<RecordingBackend>) {
        let backend = RecordingBackend::new();
        let registry = Arc::new(ResourceRegistry::new(
            backend.clone(),
            Extent2D::new(8, 4),
            DEFAULT_MIN_T_DISTANCE,
        ));
        (backend, GBufferPass::new(registry, config))
    }

    fn seeded(seed: u64) -> GBufferConfig {
        GBufferConfig {
            seed: SeedSource::Fixed(seed),
            ..GBufferConfig::default()
        }
    }

    #[test]
    fn jitter_is_reproducible_for_a_fixed_seed() {
        let mut jitters = Vec::new();
        for _ in 0..2 {
            let (_, mut pass) = pass(seeded(1234));
            pass.initialize().unwrap();
            pass.init_scene(Arc::new(RecordingScene::new("scene", 1)));
            let mut frames = Vec::new();
            for _ in 0..4 {
                pass.execute(&mut RenderContext::default()).unwrap();
                frames.push(pass.last_jitter());
            }
            jitters.push(frames);
        }

        assert_eq!(jitters[0], jitters[1]);
        assert_ne!(jitters[0][0], jitters[0][1]);
        for jitter in &jitters[0] {
            assert!((-0.5..0.5).contains(&jitter.x));
            assert!((-0.5..0.5).contains(&jitter.y));
        }
    }

    #[test]
    fn disabled_jitter_binds_zero() {
        struct Untick;
        impl OptionsUi for Untick {
            fn checkbox(&mut self, _group: &str, _label: &str, value: &mut bool) -> bool {
                *value = false;
                true
            }
        }

        let (backend, mut pass) = pass(seeded(9));
        pass.initialize().unwrap();
        pass.init_scene(Arc::new(RecordingScene::new("scene", 1)));
        assert!(pass.render_options(&mut Untick));
        pass.execute(&mut RenderContext::default()).unwrap();

        let dispatch = &backend.dispatches()[0];
        assert_eq!(
            dispatch.variables.ray_gen().get("gPixelJitter").and_then(|v| v.as_float2()),
            Some(Vec2::ZERO)
        );
    }

    #[test]
    fn specular_and_alpha_test_are_optional() {
        let (backend, mut pass) = pass(GBufferConfig {
            enable_specular_channel: true,
            enable_alpha_test: true,
            ..seeded(3)
        });
        pass.initialize().unwrap();
        pass.init_scene(Arc::new(RecordingScene::new("scene", 2)));
        assert_eq!(pass.state(), PassState::Ready);
        pass.execute(&mut RenderContext::default()).unwrap();

        let desc = pass.launch.as_ref().unwrap().desc();
        assert_eq!(desc.hit_groups[0].any_hit.as_deref(), Some(PRIMARY_ANY_HIT));
        let dispatch = &backend.dispatches()[0];
        for scope in dispatch.variables.hit_group(0).unwrap() {
            assert!(scope.get("gMatSpec").is_some());
        }
    }

    #[test]
    fn sampler_is_trilinear_and_anisotropic() {
        let (backend, mut pass) = pass(seeded(0));
        pass.initialize().unwrap();
        assert_eq!(backend.samplers(), vec![SamplerDesc::trilinear(MAX_ANISOTROPY)]);
    }

    #[test]
    fn initializing_twice_is_a_fault() {
        let (_, mut pass) = pass(seeded(0));
        pass.initialize().unwrap();
        assert!(matches!(
            pass.initialize(),
            Err(RenderError::ProgramAlreadyCompiled)
        ));
    }
}
