use crate::{
    features::Feature,
    instance::{self, InstanceConfig},
};
use ash::vk;

#[derive(Debug)]
pub struct ValidationConfig {
    pub enable: Vec<vk::ValidationFeatureEnableEXT>,
    pub disable: Vec<vk::ValidationFeatureDisableEXT>,
}

/// Enables the Khronos validation layer and routes its messages into `log`.
#[derive(Default)]
pub struct DebugFeature {}

impl DebugFeature {
    pub fn new() -> Self {
        Self {}
    }
}

impl Feature for DebugFeature {
    fn instance_extensions(&self) -> Vec<instance::Ext> {
        vec![instance::Ext::ValidationFeatures, instance::Ext::DebugUtils]
    }

    fn layers(&self) -> Vec<String> {
        vec![String::from("VK_LAYER_KHRONOS_validation")]
    }

    fn configure_instance(&self, config: &mut InstanceConfig) {
        config.validation_features = Some(ValidationConfig {
            enable: vec![
                vk::ValidationFeatureEnableEXT::BEST_PRACTICES,
                vk::ValidationFeatureEnableEXT::SYNCHRONIZATION_VALIDATION,
            ],
            disable: vec![],
        })
    }
}
