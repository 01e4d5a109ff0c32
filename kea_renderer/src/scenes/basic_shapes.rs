use crate::{error::Result, vulkan::VulkanScene};
use glam::{vec3, Mat4, Vec3};
use kea_gpu::{
    device::Device,
    ray_tracing::scenes::{Geometry, GeometryInstance, GeometryType, Scene},
};
use std::sync::Arc;

/// Hit records reserved per instance: one for shadow rays, one for everything else.
pub const RAY_TYPES: u32 = 2;

/// A ground plane with two boxes and an alpha tested panel.
pub fn basic_shapes(device: Arc<Device>) -> Result<VulkanScene> {
    let mut scene = Scene::new(device.clone(), "basic shapes".to_string(), RAY_TYPES);

    let ground = build(&device, "ground", quad(), false)?;
    scene.add_instance(
        GeometryInstance::new(ground)
            .with_transform(Mat4::from_scale(vec3(20.0, 1.0, 20.0)))
            .with_custom_index(0),
    );

    let cube = build(&device, "cube", cube(), false)?;
    scene.add_instance(
        GeometryInstance::new(cube.clone())
            .with_transform(Mat4::from_translation(vec3(1.1, 0.5, -1.8)))
            .with_custom_index(1),
    );
    scene.add_instance(
        GeometryInstance::new(cube)
            .with_transform(Mat4::from_scale_rotation_translation(
                Vec3::splat(0.6),
                glam::Quat::from_rotation_y(0.4),
                vec3(-0.1, 0.3, -1.7),
            ))
            .with_custom_index(2),
    );

    let panel = build(&device, "panel", quad(), true)?;
    scene.add_instance(
        GeometryInstance::new(panel)
            .with_transform(
                Mat4::from_translation(vec3(-0.9, 0.8, -2.4))
                    * Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2),
            )
            .with_custom_index(3),
    );

    scene.build()?;

    Ok(VulkanScene::new(scene))
}

fn build(
    device: &Arc<Device>,
    name: &str,
    geometry_type: GeometryType,
    alpha_tested: bool,
) -> Result<Arc<Geometry>> {
    let mut geometry = Geometry::new(device.clone(), name.to_string(), geometry_type, alpha_tested);
    geometry.build()?;
    Ok(Arc::new(geometry))
}

fn quad() -> GeometryType {
    GeometryType::Triangles {
        vertices: vec![
            vec3(-0.5, 0.0, -0.5),
            vec3(0.5, 0.0, -0.5),
            vec3(0.5, 0.0, 0.5),
            vec3(-0.5, 0.0, 0.5),
        ],
        indices: vec![0, 2, 1, 0, 3, 2],
    }
}

fn cube() -> GeometryType {
    let vertices = (0..8)
        .map(|corner| {
            vec3(
                if corner & 1 == 0 { -0.5 } else { 0.5 },
                if corner & 2 == 0 { -0.5 } else { 0.5 },
                if corner & 4 == 0 { -0.5 } else { 0.5 },
            )
        })
        .collect();

    #[rustfmt::skip]
    let indices = vec![
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];

    GeometryType::Triangles { vertices, indices }
}
