// Vulkan Instance - API entry and validation instrumentation
//
// Responsibilities:
// - Instance creation with validation layers + debug printf
// - Debug messenger routing validation output into `log`

use crate::config::Config;
use anyhow::{Context, Result};
use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry};
use std::ffi::{CStr, CString};

pub const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Create the Vulkan instance.
///
/// With validation enabled this also turns on `VK_EXT_debug_utils` and, if
/// configured, the debug printf validation feature so `debugPrintfEXT` output
/// from shaders reaches the debug messenger.
pub fn create_instance(entry: &Entry, config: &Config) -> Result<ash::Instance> {
    let app_name = CString::new(config.app.name.as_str())?;
    let engine_name = CString::new(config.app.engine_name.as_str())?;

    let app_info = vk::ApplicationInfo::builder()
        .application_name(&app_name)
        .application_version(config.app.version)
        .engine_name(&engine_name)
        .engine_version(config.app.engine_version)
        .api_version(vk::API_VERSION_1_3);

    let enable_validation = config.validation.enabled;

    let layer_names = if enable_validation {
        vec![VALIDATION_LAYER.as_ptr()]
    } else {
        vec![]
    };

    let extensions = if enable_validation {
        vec![DebugUtils::name().as_ptr()]
    } else {
        vec![]
    };

    let enabled_features = if enable_validation && config.validation.debug_printf {
        vec![vk::ValidationFeatureEnableEXT::DEBUG_PRINTF]
    } else {
        vec![]
    };
    let mut validation_features = vk::ValidationFeaturesEXT::builder()
        .enabled_validation_features(&enabled_features)
        .build();

    let mut create_info = vk::InstanceCreateInfo::builder()
        .application_info(&app_info)
        .enabled_layer_names(&layer_names)
        .enabled_extension_names(&extensions);

    if !enabled_features.is_empty() {
        create_info = create_info.push_next(&mut validation_features);
    }

    let instance = unsafe { entry.create_instance(&create_info, None) }
        .context("Failed to create Vulkan instance")?;

    log::info!(
        "Created Vulkan instance (validation: {}, debug printf: {})",
        enable_validation,
        !enabled_features.is_empty()
    );

    Ok(instance)
}

/// Create a debug messenger subscribed to the configured severities and all message types
pub fn setup_debug_messenger(
    entry: &Entry,
    instance: &ash::Instance,
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
) -> Result<(DebugUtils, vk::DebugUtilsMessengerEXT)> {
    let debug_utils = DebugUtils::new(entry, instance);

    let create_info = vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(severity)
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback));

    let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None) }
        .context("Failed to create debug messenger")?;

    Ok((debug_utils, messenger))
}

/// Log level a validation message of the given severity is reported at
pub fn log_level_for(severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> log::Level {
    if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::Level::Error
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        log::Level::Warn
    } else if severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        log::Level::Info
    } else {
        log::Level::Trace
    }
}

// Debug callback for validation layers (debug printf output arrives as INFO)
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() || (*p_callback_data).p_message.is_null() {
        return vk::FALSE;
    }

    let message = CStr::from_ptr((*p_callback_data).p_message);
    log::log!(
        target: "vulkan",
        log_level_for(message_severity),
        "{}",
        message.to_string_lossy()
    );

    vk::FALSE
}

#[cfg(test)]
mod tests {
    use super::*;
    use vk::DebugUtilsMessageSeverityFlagsEXT as Severity;

    #[test]
    fn severities_map_onto_log_levels() {
        assert_eq!(log_level_for(Severity::ERROR), log::Level::Error);
        assert_eq!(log_level_for(Severity::WARNING), log::Level::Warn);
        assert_eq!(log_level_for(Severity::INFO), log::Level::Info);
        assert_eq!(log_level_for(Severity::VERBOSE), log::Level::Trace);
    }

    #[test]
    fn combined_severity_reports_the_most_severe_bit() {
        assert_eq!(log_level_for(Severity::INFO | Severity::ERROR), log::Level::Error);
        assert_eq!(log_level_for(Severity::VERBOSE | Severity::WARNING), log::Level::Warn);
    }

    #[test]
    fn callback_never_aborts_the_call() {
        let message = c"Hello world, thread 3";
        let data = vk::DebugUtilsMessengerCallbackDataEXT::builder()
            .message(message)
            .build();

        let result = unsafe {
            debug_callback(
                Severity::INFO,
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                &data,
                std::ptr::null_mut(),
            )
        };
        assert_eq!(result, vk::FALSE);

        let result = unsafe {
            debug_callback(
                Severity::ERROR,
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                std::ptr::null(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(result, vk::FALSE);
    }
}
