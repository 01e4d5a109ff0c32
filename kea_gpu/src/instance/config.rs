use crate::debug::ValidationConfig;
use ash::vk;

#[derive(Debug)]
pub struct InstanceConfig {
    pub api_version: u32,
    pub validation_features: Option<ValidationConfig>,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            api_version: vk::API_VERSION_1_2,
            validation_features: None,
        }
    }
}
