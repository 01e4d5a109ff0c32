use ash::{extensions::ext, vk};
use std::os::raw::c_char;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ext {
    DebugUtils,
    ValidationFeatures,
}

impl Ext {
    pub fn name(&self) -> *const c_char {
        match self {
            Ext::DebugUtils => ext::DebugUtils::name().as_ptr(),
            Ext::ValidationFeatures => vk::ExtValidationFeaturesFn::name().as_ptr(),
        }
    }
}

#[derive(Default)]
pub struct InstanceExtensions {
    pub debug_utils: Option<ext::DebugUtils>,
}

impl InstanceExtensions {
    pub fn new(entry: &ash::Entry, instance: &ash::Instance, extensions: &[Ext]) -> Self {
        let mut ext = InstanceExtensions::default();

        for extension in extensions {
            match extension {
                Ext::DebugUtils => ext.debug_utils = Some(ext::DebugUtils::new(entry, instance)),
                Ext::ValidationFeatures => (),
            }
        }

        ext
    }

    pub fn debug_utils(&self) -> Option<&ext::DebugUtils> {
        self.debug_utils.as_ref()
    }
}
