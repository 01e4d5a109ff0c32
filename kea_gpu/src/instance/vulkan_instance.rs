use super::{Ext, InstanceConfig, InstanceExtensions};
use crate::{debug::DebugMessenger, device::PhysicalDevice, features::Feature, Result};
use ash::vk;
use log::info;
use std::{ffi::CString, os::raw::c_char, sync::Arc};

pub struct VulkanInstance {
    entry: ash::Entry,
    raw: ash::Instance,
    ext: InstanceExtensions,
    messenger: Option<DebugMessenger>,
}

impl VulkanInstance {
    pub fn new(features: &[Box<dyn Feature + '_>]) -> Result<Arc<VulkanInstance>> {
        let entry = unsafe { ash::Entry::load() }?;

        let mut config = InstanceConfig::default();
        let mut extensions: Vec<Ext> = vec![];
        let mut layers: Vec<CString> = vec![];

        for feature in features {
            extensions.extend(feature.instance_extensions());
            for layer in feature.layers() {
                // Layer names come from our own features and never contain NUL bytes.
                layers.extend(CString::new(layer).ok());
            }
            feature.configure_instance(&mut config);
        }

        info!("Instance config: {:?}", config);
        info!("Requested instance extensions: {:?}", extensions);
        info!("Requested layers: {:?}", layers);

        let raw = Self::create_instance(&entry, &config, &extensions, &layers)?;
        let ext = InstanceExtensions::new(&entry, &raw, &extensions);
        let messenger = match ext.debug_utils() {
            Some(debug_utils) => Some(DebugMessenger::new(debug_utils)?),
            None => None,
        };

        Ok(Arc::new(VulkanInstance {
            entry,
            raw,
            ext,
            messenger,
        }))
    }

    fn create_instance(
        entry: &ash::Entry,
        config: &InstanceConfig,
        extensions: &[Ext],
        layers: &[CString],
    ) -> Result<ash::Instance> {
        let app_info = vk::ApplicationInfo::builder().api_version(config.api_version);

        let extension_names: Vec<*const c_char> = extensions.iter().map(|ext| ext.name()).collect();
        let layer_names: Vec<*const c_char> = layers.iter().map(|name| name.as_ptr()).collect();

        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names);

        let mut validation_features = config.validation_features.as_ref().map(|validation| {
            vk::ValidationFeaturesEXT::builder()
                .enabled_validation_features(&validation.enable)
                .disabled_validation_features(&validation.disable)
                .build()
        });
        if let Some(validation_features) = validation_features.as_mut() {
            create_info = create_info.push_next(validation_features);
        }

        Ok(unsafe { entry.create_instance(&create_info, None) }?)
    }

    pub unsafe fn raw(&self) -> &ash::Instance {
        &self.raw
    }

    pub unsafe fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    pub fn ext(&self) -> &InstanceExtensions {
        &self.ext
    }

    pub fn physical_devices(self: &Arc<VulkanInstance>) -> Result<Vec<Arc<PhysicalDevice>>> {
        let raws = unsafe { self.raw.enumerate_physical_devices() }?;

        Ok(raws
            .into_iter()
            .map(|raw| Arc::new(unsafe { PhysicalDevice::from_raw(raw, self.clone()) }))
            .collect())
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let (Some(messenger), Some(debug_utils)) =
                (self.messenger.take(), self.ext.debug_utils())
            {
                messenger.destroy(debug_utils);
            }
            self.raw.destroy_instance(None);
        }
    }
}
