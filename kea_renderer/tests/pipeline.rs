use glam::Vec4;
use kea_renderer::{
    backend::{Extent2D, RayTracingBackend},
    config::{CompileFaultPolicy, DiffuseGiConfig, GBufferConfig, SeedSource},
    passes::{DiffuseGiPass, GBufferPass, OptionsUi, Pass, RenderPass},
    pipeline::RenderPipeline,
    recording::{RecordingBackend, RecordingScene, ShaderCatalogue},
    registry::{ResourceRegistry, DEFAULT_MIN_T_DISTANCE, OUTPUT_CHANNEL_KEY},
};
use std::sync::Arc;

fn pipeline(backend: RecordingBackend, policy: CompileFaultPolicy) -> RenderPipeline<RecordingBackend> {
    let registry = Arc::new(ResourceRegistry::new(
        backend,
        Extent2D::new(4, 4),
        DEFAULT_MIN_T_DISTANCE,
    ));
    let mut pipeline = RenderPipeline::new(registry.clone(), policy);
    pipeline.add_pass(GBufferPass::new(
        registry.clone(),
        GBufferConfig {
            seed: SeedSource::Fixed(5),
            ..GBufferConfig::default()
        },
    ));
    pipeline.add_pass(DiffuseGiPass::new(registry, DiffuseGiConfig::default()));
    pipeline
}

/// Flips every checkbox carrying `label` and records what was drawn.
struct Toggle {
    label: &'static str,
    drawn: Vec<(String, String)>,
}

impl Toggle {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            drawn: Vec::new(),
        }
    }
}

impl OptionsUi for Toggle {
    fn checkbox(&mut self, group: &str, label: &str, value: &mut bool) -> bool {
        self.drawn.push((group.to_string(), label.to_string()));
        if label == self.label {
            *value = !*value;
            true
        } else {
            false
        }
    }
}

#[test]
fn frames_dispatch_every_pass_once_a_scene_is_bound() {
    let backend = RecordingBackend::new();
    let mut pipeline = pipeline(backend.clone(), CompileFaultPolicy::Abort);
    pipeline.initialize().unwrap();

    let report = pipeline.execute_frame().unwrap();
    assert_eq!(report.dispatched, 0);
    assert_eq!(report.skipped, 2);

    pipeline.set_scene(Arc::new(RecordingScene::new("scene", 3)));
    let report = pipeline.execute_frame().unwrap();
    assert!(report.restarted);
    assert_eq!(report.frame, 0);
    assert_eq!(report.dispatched, 2);

    let report = pipeline.execute_frame().unwrap();
    assert!(!report.restarted);
    assert_eq!(report.frame, 1);

    let entries: Vec<String> = backend
        .dispatches()
        .iter()
        .map(|record| record.ray_gen.entry.clone())
        .collect();
    assert_eq!(
        entries,
        ["GBufferRayGen", "DiffuseGIRayGen", "GBufferRayGen", "DiffuseGIRayGen"]
    );
}

#[test]
fn option_changes_restart_the_frame_index() {
    let mut pipeline = pipeline(RecordingBackend::new(), CompileFaultPolicy::Abort);
    pipeline.initialize().unwrap();
    pipeline.set_scene(Arc::new(RecordingScene::new("scene", 1)));
    for _ in 0..3 {
        pipeline.execute_frame().unwrap();
    }

    let mut untouched = Toggle::new("Nothing");
    assert!(!pipeline.render_options(&mut untouched));
    assert!(!pipeline.is_stale());
    assert_eq!(
        untouched.drawn,
        [
            ("G-Buffer Options".to_string(), "Jitter Camera".to_string()),
            ("Diffuse GI Options".to_string(), "Shadow Rays".to_string()),
            ("Diffuse GI Options".to_string(), "GI Rays".to_string()),
        ]
    );
    assert_eq!(pipeline.execute_frame().unwrap().frame, 3);

    assert!(pipeline.render_options(&mut Toggle::new("GI Rays")));
    assert!(pipeline.is_stale());
    let report = pipeline.execute_frame().unwrap();
    assert!(report.restarted);
    assert_eq!(report.frame, 0);

    let gi_rays = pipeline.passes().find_map(|pass| match pass {
        Pass::DiffuseGi(pass) => Some(pass.gi_rays()),
        _ => None,
    });
    assert_eq!(gi_rays, Some(false));
}

#[test]
fn resize_marks_output_stale() {
    let mut pipeline = pipeline(RecordingBackend::new(), CompileFaultPolicy::Abort);
    pipeline.initialize().unwrap();
    pipeline.set_scene(Arc::new(RecordingScene::new("scene", 1)));
    pipeline.execute_frame().unwrap();

    pipeline.resize(Extent2D::new(4, 4));
    assert!(!pipeline.is_stale());
    pipeline.resize(Extent2D::new(2, 2));
    assert!(pipeline.is_stale());
    assert_eq!(pipeline.registry().screen_extent(), Extent2D::new(2, 2));
}

fn gbuffer_only_catalogue() -> ShaderCatalogue {
    ShaderCatalogue::new().with_source(
        "rtGBuffer",
        &[
            ("GBufferRayGen", &["gPixelJitter", "gMinT"][..]),
            ("PrimaryMiss", &[][..]),
            ("PrimaryClosestHit", &[][..]),
        ],
    )
}

#[test]
fn compile_faults_disable_the_pass() {
    let backend = RecordingBackend::with_catalogue(gbuffer_only_catalogue());
    let mut pipeline = pipeline(backend.clone(), CompileFaultPolicy::DisablePass);
    pipeline.initialize().unwrap();
    assert!(pipeline.is_enabled(0));
    assert!(!pipeline.is_enabled(1));

    let gi = pipeline.passes().nth(1).unwrap();
    assert_eq!(gi.compile_error().unwrap().source_id, "rtDiffuseGI");

    pipeline.set_scene(Arc::new(RecordingScene::new("scene", 1)));
    let report = pipeline.execute_frame().unwrap();
    assert_eq!(report.dispatched, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(backend.dispatches().len(), 1);
}

#[test]
fn disabled_passes_still_clear_their_output() {
    let backend = RecordingBackend::with_catalogue(gbuffer_only_catalogue());
    let mut pipeline = pipeline(backend.clone(), CompileFaultPolicy::DisablePass);
    pipeline.initialize().unwrap();
    pipeline.set_scene(Arc::new(RecordingScene::new("scene", 1)));

    let output = pipeline.registry().fetch(OUTPUT_CHANNEL_KEY).unwrap().unwrap();
    backend.clear_texture(&output, Vec4::ONE).unwrap();

    let report = pipeline.execute_frame().unwrap();
    assert_eq!(report.skipped, 1);
    let texels = pipeline.registry().read_texels(OUTPUT_CHANNEL_KEY).unwrap().unwrap();
    assert!(texels.iter().all(|texel| *texel == Vec4::ZERO));
    assert!(backend
        .dispatches()
        .iter()
        .all(|record| record.ray_gen.entry == "GBufferRayGen"));
}

#[test]
fn compile_faults_abort_when_asked() {
    let backend = RecordingBackend::with_catalogue(gbuffer_only_catalogue());
    let mut pipeline = pipeline(backend, CompileFaultPolicy::Abort);
    let err = pipeline.initialize().unwrap_err();
    assert!(err.is_compile_fault());
}

#[test]
fn passes_sharing_an_output_are_reported() {
    let backend = RecordingBackend::new();
    let registry = Arc::new(ResourceRegistry::new(
        backend,
        Extent2D::new(4, 4),
        DEFAULT_MIN_T_DISTANCE,
    ));
    let mut pipeline = RenderPipeline::new(registry.clone(), CompileFaultPolicy::Abort);
    pipeline.add_pass(DiffuseGiPass::new(registry.clone(), DiffuseGiConfig::default()));
    pipeline.add_pass(DiffuseGiPass::new(registry.clone(), DiffuseGiConfig::default()));
    pipeline.add_pass(DiffuseGiPass::new(
        registry,
        DiffuseGiConfig {
            output_key: Some("IndirectOnly".to_string()),
            ..DiffuseGiConfig::default()
        },
    ));
    pipeline.initialize().unwrap();

    assert_eq!(
        pipeline.shared_writers(),
        vec![(
            OUTPUT_CHANNEL_KEY.to_string(),
            vec!["Diffuse GI".to_string(), "Diffuse GI".to_string()]
        )]
    );
}

#[test]
fn gbuffer_and_gi_write_disjoint_resources() {
    let mut pipeline = pipeline(RecordingBackend::new(), CompileFaultPolicy::Abort);
    pipeline.initialize().unwrap();
    assert!(pipeline.shared_writers().is_empty());
    assert!(pipeline.registry().is_declared(OUTPUT_CHANNEL_KEY));
}
