use glam::{Vec2, Vec4};
use kea_renderer::{
    backend::{Extent2D, RayTracingBackend},
    config::{DiffuseGiConfig, GBufferConfig, SeedSource},
    launch::{DispatchStatus, RenderContext},
    passes::{
        DiffuseGiPass, GBufferPass, PassState, RenderPass, DIFFUSE_COLOR, WORLD_NORMAL,
        WORLD_POSITION,
    },
    recording::{RecordingBackend, RecordingScene, ShaderCatalogue},
    registry::{ResourceRegistry, DEFAULT_MIN_T_DISTANCE, OUTPUT_CHANNEL_KEY},
    RenderError,
};
use std::sync::Arc;

type Registry = Arc<ResourceRegistry<RecordingBackend>>;

fn registry(backend: RecordingBackend) -> Registry {
    Arc::new(ResourceRegistry::new(
        backend,
        Extent2D::new(8, 4),
        DEFAULT_MIN_T_DISTANCE,
    ))
}

fn seeded(seed: u64) -> GBufferConfig {
    GBufferConfig {
        seed: SeedSource::Fixed(seed),
        ..GBufferConfig::default()
    }
}

#[test]
fn gbuffer_binds_every_instance_of_a_three_instance_scene() {
    let backend = RecordingBackend::new();
    let registry = registry(backend.clone());
    let mut pass = GBufferPass::new(registry.clone(), seeded(3));
    pass.initialize().unwrap();
    pass.init_scene(Arc::new(RecordingScene::new("three", 3)));
    assert_eq!(pass.state(), PassState::Ready);

    let mut ctx = RenderContext::new(0);
    assert_eq!(pass.execute(&mut ctx).unwrap(), DispatchStatus::Dispatched);
    assert_eq!(ctx.dispatches(), 1);

    let dispatches = backend.dispatches();
    assert_eq!(dispatches.len(), 1);
    let record = &dispatches[0];
    assert_eq!(record.ray_gen.entry, "GBufferRayGen");
    assert_eq!(record.scene, "three");
    assert_eq!(record.extent, Extent2D::new(8, 4));

    let world_position = registry.fetch(WORLD_POSITION).unwrap().unwrap();
    let world_normal = registry.fetch(WORLD_NORMAL).unwrap().unwrap();
    let diffuse = registry.fetch(DIFFUSE_COLOR).unwrap().unwrap();

    let hits = record.variables.hit_group(0).unwrap();
    assert_eq!(hits.len(), 3);
    for scope in hits {
        assert_eq!(scope.get("gWsPos").unwrap().as_texture(), Some(&world_position));
        assert_eq!(scope.get("gWsNorm").unwrap().as_texture(), Some(&world_normal));
        assert_eq!(scope.get("gMatDif").unwrap().as_texture(), Some(&diffuse));
        assert!(scope.get("gMatSpec").is_none());
    }

    let miss = record.variables.miss(0).unwrap();
    assert!(miss.get("gEnvMap").unwrap().as_texture().is_some());
    assert!(miss.get("gEnvSampler").unwrap().as_sampler().is_some());
    assert_eq!(miss.get("gMatDif").unwrap().as_texture(), Some(&diffuse));

    let ray_gen = record.variables.ray_gen();
    assert_eq!(
        ray_gen.get("gMinT").unwrap().as_float(),
        Some(DEFAULT_MIN_T_DISTANCE)
    );
    let jitter = ray_gen.get("gPixelJitter").unwrap().as_float2().unwrap();
    assert_eq!(jitter, pass.last_jitter());
    assert!(jitter.x >= -0.5 && jitter.x < 0.5);
    assert!(jitter.y >= -0.5 && jitter.y < 0.5);
}

#[test]
fn gbuffer_channels_are_cleared_to_zero_each_frame() {
    let backend = RecordingBackend::new();
    let registry = registry(backend.clone());
    let mut pass = GBufferPass::new(registry.clone(), seeded(1));
    pass.initialize().unwrap();
    pass.init_scene(Arc::new(RecordingScene::new("scene", 1)));

    let diffuse = registry.fetch(DIFFUSE_COLOR).unwrap().unwrap();
    backend.clear_texture(&diffuse, Vec4::ONE).unwrap();

    pass.execute(&mut RenderContext::default()).unwrap();
    let texels = registry.read_texels(DIFFUSE_COLOR).unwrap().unwrap();
    assert!(texels.iter().all(|texel| *texel == Vec4::ZERO));
}

#[test]
fn seeded_jitter_sequences_repeat() {
    let run = |seed: u64| -> Vec<Vec2> {
        let registry = registry(RecordingBackend::new());
        let mut pass = GBufferPass::new(registry, seeded(seed));
        pass.initialize().unwrap();
        pass.init_scene(Arc::new(RecordingScene::new("scene", 1)));
        (0..4)
            .map(|_| {
                pass.execute(&mut RenderContext::default()).unwrap();
                pass.last_jitter()
            })
            .collect()
    };

    let first = run(42);
    assert_eq!(first, run(42));
    assert_ne!(first, run(43));
    assert!(first.windows(2).any(|pair| pair[0] != pair[1]));
}

#[test]
fn gi_frame_counter_starts_at_its_seed() {
    let backend = RecordingBackend::new();
    let registry = registry(backend.clone());
    let mut pass = DiffuseGiPass::new(registry, DiffuseGiConfig::default());
    pass.initialize().unwrap();
    pass.init_scene(Arc::new(RecordingScene::new("scene", 2)));

    let frame_counts = || -> Vec<u32> {
        backend
            .dispatches()
            .iter()
            .map(|record| {
                record
                    .variables
                    .ray_gen()
                    .get("gFrameCount")
                    .and_then(|value| value.as_uint())
                    .unwrap()
            })
            .collect()
    };

    for _ in 0..3 {
        assert_eq!(
            pass.execute(&mut RenderContext::default()).unwrap(),
            DispatchStatus::Dispatched
        );
    }
    assert_eq!(frame_counts(), vec![0xdeadbeef, 0xdeadbef0, 0xdeadbef1]);
    assert_eq!(pass.frame_count(), 0xdeadbef2);
}

#[test]
fn gi_without_shadows_binds_its_flags_and_counter() {
    let backend = RecordingBackend::new();
    let registry = registry(backend.clone());
    let mut pass = DiffuseGiPass::new(
        registry,
        DiffuseGiConfig {
            shadow_rays: false,
            gi_rays: true,
            ..DiffuseGiConfig::default()
        },
    );
    pass.initialize().unwrap();
    pass.init_scene(Arc::new(RecordingScene::new("scene", 3)));

    let mut ctx = RenderContext::default();
    pass.execute(&mut ctx).unwrap();
    pass.execute(&mut ctx).unwrap();
    assert_eq!(ctx.dispatches(), 2);

    let dispatches = backend.take_dispatches();
    let mut frame_counts = Vec::new();
    for record in &dispatches {
        let ray_gen = record.variables.ray_gen();
        assert_eq!(ray_gen.get("gShadows").unwrap().as_bool(), Some(false));
        assert_eq!(ray_gen.get("gGI").unwrap().as_bool(), Some(true));
        frame_counts.push(ray_gen.get("gFrameCount").unwrap().as_uint().unwrap());

        assert!(record.variables.miss(0).unwrap().is_empty());
        let shadow_hits = record.variables.hit_group(0).unwrap();
        assert_eq!(shadow_hits.len(), 3);
        assert!(shadow_hits.iter().all(|scope| scope.is_empty()));
    }
    assert_eq!(frame_counts, vec![0xdeadbeef, 0xdeadbef0]);
    assert!(backend.dispatches().is_empty());
}

#[test]
fn gi_toggles_only_touch_their_own_flags() {
    let backend = RecordingBackend::new();
    let registry = registry(backend.clone());
    let mut pass = DiffuseGiPass::new(registry, DiffuseGiConfig::default());
    pass.initialize().unwrap();
    pass.init_scene(Arc::new(RecordingScene::new("scene", 2)));

    let flags = |index: usize| -> (bool, bool) {
        let dispatches = backend.dispatches();
        let ray_gen = dispatches[index].variables.ray_gen();
        (
            ray_gen.get("gShadows").unwrap().as_bool().unwrap(),
            ray_gen.get("gGI").unwrap().as_bool().unwrap(),
        )
    };

    pass.execute(&mut RenderContext::default()).unwrap();
    assert_eq!(flags(0), (true, true));

    pass.set_gi_rays(false);
    pass.execute(&mut RenderContext::default()).unwrap();
    assert_eq!(flags(1), (true, false));

    pass.set_gi_rays(true);
    pass.set_shadow_rays(false);
    pass.execute(&mut RenderContext::default()).unwrap();
    assert_eq!(flags(2), (false, true));

    // The environment only ever reaches the GI miss slot.
    for record in backend.dispatches() {
        assert!(record.variables.miss(0).unwrap().is_empty());
        let gi_miss = record.variables.miss(1).unwrap();
        assert!(gi_miss.get("gEnvMap").is_some());
        assert!(gi_miss.get("gEnvSampler").is_some());
    }
}

#[test]
fn gi_reads_the_gbuffer_channels() {
    let backend = RecordingBackend::new();
    let registry = registry(backend.clone());
    let mut gbuffer = GBufferPass::new(registry.clone(), seeded(9));
    let mut gi = DiffuseGiPass::new(registry.clone(), DiffuseGiConfig::default());
    gbuffer.initialize().unwrap();
    gi.initialize().unwrap();
    let scene = Arc::new(RecordingScene::new("scene", 2));
    gbuffer.init_scene(scene.clone());
    gi.init_scene(scene);

    let mut ctx = RenderContext::new(0);
    gbuffer.execute(&mut ctx).unwrap();
    gi.execute(&mut ctx).unwrap();
    assert_eq!(ctx.dispatches(), 2);

    let dispatches = backend.dispatches();
    let ray_gen = dispatches[1].variables.ray_gen();
    assert_eq!(
        ray_gen.get("gWorldPos").unwrap().as_texture(),
        registry.fetch(WORLD_POSITION).unwrap().as_ref()
    );
    assert_eq!(
        ray_gen.get("gOutput").unwrap().as_texture(),
        registry.fetch(OUTPUT_CHANNEL_KEY).unwrap().as_ref()
    );
}

#[test]
fn compile_fault_leaves_the_pass_unable_to_render() {
    let catalogue = ShaderCatalogue::new().with_source("rtGBuffer", &[("GBufferRayGen", &[][..])]);
    let backend = RecordingBackend::with_catalogue(catalogue);
    let registry = registry(backend.clone());
    let mut pass = GBufferPass::new(registry, seeded(0));

    let err = pass.initialize().unwrap_err();
    assert!(err.is_compile_fault());
    let compile_error = pass.compile_error().unwrap();
    assert_eq!(compile_error.source_id, "rtGBuffer");

    pass.init_scene(Arc::new(RecordingScene::new("scene", 1)));
    assert_eq!(pass.state(), PassState::SceneBound);
    assert_eq!(
        pass.execute(&mut RenderContext::default()).unwrap(),
        DispatchStatus::Skipped
    );
    assert!(backend.dispatches().is_empty());
    assert!(matches!(pass.initialize(), Err(RenderError::ProgramAlreadyCompiled)));
}

#[test]
fn empty_screen_skips_without_allocating() {
    let backend = RecordingBackend::new();
    let registry = Arc::new(ResourceRegistry::new(
        backend.clone(),
        Extent2D::new(0, 0),
        DEFAULT_MIN_T_DISTANCE,
    ));
    let mut pass = GBufferPass::new(registry, seeded(0));
    pass.initialize().unwrap();
    pass.init_scene(Arc::new(RecordingScene::new("scene", 1)));

    assert_eq!(
        pass.execute(&mut RenderContext::default()).unwrap(),
        DispatchStatus::Skipped
    );
    assert_eq!(backend.texture_count(), 0);
    assert!(backend.dispatches().is_empty());
}
