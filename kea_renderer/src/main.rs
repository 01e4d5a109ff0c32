use anyhow::Context;
use env_logger::Env;
use glam::Vec4;
use image::{DynamicImage, Rgba32FImage};
use kea_gpu::Kea;
use kea_renderer::{
    backend::{Extent2D, RayTracingBackend},
    config::RendererConfig,
    passes::{DiffuseGiPass, GBufferPass},
    pipeline::RenderPipeline,
    recording::{RecordingBackend, RecordingScene},
    registry::ResourceRegistry,
    scenes::basic_shapes,
    vulkan::VulkanBackend,
};
use std::{path::Path, sync::Arc};

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => RendererConfig::from_file(Path::new(&path))
            .with_context(|| format!("failed to load configuration from {}", path))?,
        None => RendererConfig::default(),
    };

    if config.headless {
        let scene = Arc::new(RecordingScene::new("basic shapes", 4));
        return render(RecordingBackend::new(), scene, &config);
    }

    let kea = Kea::new(config.validation, vec![]).context("failed to create a ray tracing device")?;
    let backend = VulkanBackend::new(kea.device().clone(), &config.shader_dir);
    let scene = Arc::new(basic_shapes(kea.device().clone())?);
    render(backend, scene, &config)?;
    kea.device().wait_until_idle()?;

    Ok(())
}

fn render<B: RayTracingBackend>(
    backend: B,
    scene: Arc<B::Scene>,
    config: &RendererConfig,
) -> anyhow::Result<()> {
    let registry = Arc::new(ResourceRegistry::new(
        backend,
        config.extent(),
        config.min_t_distance,
    ));

    let mut pipeline = RenderPipeline::new(registry.clone(), config.compile_fault_policy);
    pipeline.add_pass(GBufferPass::new(registry.clone(), config.gbuffer.clone()));
    let diffuse_gi = DiffuseGiPass::new(registry.clone(), config.diffuse_gi.clone());
    let output_key = diffuse_gi.output_key().to_string();
    pipeline.add_pass(diffuse_gi);

    pipeline.initialize()?;
    pipeline.set_scene(scene);

    for _ in 0..config.frames {
        let report = pipeline.execute_frame()?;
        log::info!(
            "Frame {}: {} dispatched, {} skipped",
            report.frame,
            report.dispatched,
            report.skipped
        );
    }

    if let Some(path) = &config.output_image {
        match registry.read_texels(&output_key)? {
            Some(texels) => {
                save_image(path, registry.screen_extent(), &texels)?;
                log::info!("Wrote {}", path.display());
            }
            None => log::warn!("{} was never allocated, nothing to write", output_key),
        }
    }

    Ok(())
}

fn save_image(path: &Path, extent: Extent2D, texels: &[Vec4]) -> anyhow::Result<()> {
    let floats = texels.iter().flat_map(|texel| texel.to_array()).collect();
    let buffer = Rgba32FImage::from_raw(extent.width, extent.height, floats)
        .context("output texels do not match the screen extent")?;
    let image = DynamicImage::ImageRgba32F(buffer);

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("exr") => image.save(path)?,
        Some("hdr") => DynamicImage::ImageRgb32F(image.to_rgb32f()).save(path)?,
        _ => DynamicImage::ImageRgba8(image.to_rgba8()).save(path)?,
    }
    Ok(())
}
