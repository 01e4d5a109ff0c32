//! The shipped shader manifests and the recording backend's catalogue must
//! agree, or headless runs stop predicting what a device run binds.

use kea_gpu::shaders::{EntryPointManifest, ParameterKind, ShaderManifest};
use kea_renderer::{
    backend::{ParameterSet, RayTracingBackend},
    program::RayProgramBuilder,
    recording::RecordingBackend,
};

fn manifest(json: &str) -> ShaderManifest {
    ShaderManifest::from_json(json).unwrap()
}

/// Parameters a pass can bind by name. The scene is bound by the backend.
fn bindable(entries: &[&EntryPointManifest]) -> Vec<String> {
    let mut names: Vec<String> = entries
        .iter()
        .flat_map(|entry| entry.parameters.iter())
        .filter(|param| param.kind != ParameterKind::AccelerationStructure)
        .map(|param| param.name.clone())
        .collect();
    names.sort();
    names.dedup();
    names
}

fn names(set: &ParameterSet) -> Vec<String> {
    set.iter().map(str::to_string).collect()
}

#[test]
fn gbuffer_manifest_matches_catalogue() {
    let manifest = manifest(include_str!("../shaders/rtGBuffer.json"));
    let entry = |name: &str| manifest.entry_point(name).unwrap();

    let mut builder = RayProgramBuilder::new("rtGBuffer", "GBufferRayGen").unwrap();
    builder.add_miss("rtGBuffer", "PrimaryMiss");
    builder
        .add_hit_group("rtGBuffer", "PrimaryClosestHit", "PrimaryAnyHit")
        .unwrap();
    let (_, reflection) = RecordingBackend::new()
        .compile_program(&builder.build())
        .unwrap();

    assert_eq!(names(&reflection.ray_gen), bindable(&[entry("GBufferRayGen")]));
    assert_eq!(names(&reflection.miss[0]), bindable(&[entry("PrimaryMiss")]));
    assert_eq!(
        names(&reflection.hit_groups[0]),
        bindable(&[entry("PrimaryClosestHit"), entry("PrimaryAnyHit")])
    );
}

#[test]
fn diffuse_gi_manifest_matches_catalogue() {
    let manifest = manifest(include_str!("../shaders/rtDiffuseGI.json"));
    let entry = |name: &str| manifest.entry_point(name).unwrap();

    let mut builder = RayProgramBuilder::new("rtDiffuseGI", "DiffuseGIRayGen").unwrap();
    builder.add_miss("rtDiffuseGI", "ShadowMiss");
    builder.add_hit_group("rtDiffuseGI", "", "ShadowHit").unwrap();
    builder.add_miss("rtDiffuseGI", "GIMiss");
    builder
        .add_hit_group("rtDiffuseGI", "GIClosestHit", "GIAnyHit")
        .unwrap();
    let (_, reflection) = RecordingBackend::new()
        .compile_program(&builder.build())
        .unwrap();

    assert_eq!(names(&reflection.ray_gen), bindable(&[entry("DiffuseGIRayGen")]));
    assert!(reflection.miss[0].is_empty());
    assert_eq!(names(&reflection.miss[1]), bindable(&[entry("GIMiss")]));
    assert!(reflection.hit_groups[0].is_empty());
    assert!(reflection.hit_groups[1].is_empty());
}

#[test]
fn constant_blocks_fit_their_parameters() {
    let gbuffer = manifest(include_str!("../shaders/rtGBuffer.json"));
    assert_eq!(
        gbuffer.entry_point("GBufferRayGen").unwrap().constant_block_size(),
        12
    );

    let gi = manifest(include_str!("../shaders/rtDiffuseGI.json"));
    assert_eq!(
        gi.entry_point("DiffuseGIRayGen").unwrap().constant_block_size(),
        16
    );
}
