use crate::backend::RayTracingScene;
use kea_gpu::ray_tracing::scenes::Scene;

/// A built top level acceleration structure. Every instance is shaded by
/// every hit group, so each slot sees all instances.
pub struct VulkanScene {
    scene: Scene,
}

impl VulkanScene {
    pub fn new(scene: Scene) -> Self {
        Self { scene }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}

impl RayTracingScene for VulkanScene {
    fn name(&self) -> &str {
        self.scene.name()
    }

    fn hit_group_instance_count(&self, _slot: usize) -> usize {
        self.scene.instances().len()
    }
}
