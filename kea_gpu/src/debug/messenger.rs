use crate::Result;
use ash::{extensions::ext, vk};
use std::{ffi::CStr, os::raw::c_void};

unsafe extern "system" fn vulkan_debug_callback(
    flag: vk::DebugUtilsMessageSeverityFlagsEXT,
    typ: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _: *mut c_void,
) -> vk::Bool32 {
    if callback_data.is_null() || (*callback_data).p_message.is_null() {
        return vk::FALSE;
    }

    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();
    match flag {
        vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE => log::trace!("{:?} - {}", typ, message),
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => log::debug!("{:?} - {}", typ, message),
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => log::warn!("{:?} - {}", typ, message),
        _ => log::error!("{:?} - {}", typ, message),
    }

    vk::FALSE
}

pub struct DebugMessenger(vk::DebugUtilsMessengerEXT);

impl DebugMessenger {
    pub fn new(debug_utils: &ext::DebugUtils) -> Result<Self> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(vulkan_debug_callback));

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }?;

        Ok(Self(messenger))
    }

    pub unsafe fn destroy(self, debug_utils: &ext::DebugUtils) {
        debug_utils.destroy_debug_utils_messenger(self.0, None);
    }
}
