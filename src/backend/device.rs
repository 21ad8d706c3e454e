// Vulkan Device - Core GPU interface
//
// Responsibilities:
// - Physical device selection (first enumerated)
// - Compute queue family lookup
// - Logical device + queue creation

use anyhow::{Context, Result};
use ash::vk;
use std::ffi::CStr;

/// Pick the first physical device the instance reports
pub fn pick_physical_device(instance: &ash::Instance) -> Result<vk::PhysicalDevice> {
    let devices = unsafe { instance.enumerate_physical_devices() }
        .context("Failed to enumerate physical devices")?;

    first_physical_device(&devices)
}

fn first_physical_device(devices: &[vk::PhysicalDevice]) -> Result<vk::PhysicalDevice> {
    devices
        .first()
        .copied()
        .ok_or_else(|| anyhow::anyhow!("No Vulkan physical device available"))
}

/// Index of the first queue family with compute support
pub fn find_compute_queue_family(families: &[vk::QueueFamilyProperties]) -> Option<u32> {
    families
        .iter()
        .position(|props| props.queue_flags.contains(vk::QueueFlags::COMPUTE))
        .map(|i| i as u32)
}

pub fn compute_queue_family(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
) -> Result<u32> {
    let families = unsafe { instance.get_physical_device_queue_family_properties(physical_device) };

    let index = find_compute_queue_family(&families)
        .context("Could not find compute queue")?;

    log::info!("Using compute queue family {} of {}", index, families.len());
    Ok(index)
}

/// Log which GPU was selected
pub fn describe_physical_device(instance: &ash::Instance, physical_device: vk::PhysicalDevice) {
    let properties = unsafe { instance.get_physical_device_properties(physical_device) };

    log::info!(
        "Selected GPU: {}",
        unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }.to_string_lossy()
    );
    log::info!(
        "API Version: {}.{}.{}",
        vk::api_version_major(properties.api_version),
        vk::api_version_minor(properties.api_version),
        vk::api_version_patch(properties.api_version)
    );
}

/// Create a logical device exposing a single queue from `queue_family`
pub fn create_logical_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    queue_family: u32,
) -> Result<ash::Device> {
    let queue_priorities = [1.0];
    let queue_create_info = vk::DeviceQueueCreateInfo::builder()
        .queue_family_index(queue_family)
        .queue_priorities(&queue_priorities)
        .build();

    let create_info = vk::DeviceCreateInfo::builder()
        .queue_create_infos(std::slice::from_ref(&queue_create_info));

    let device = unsafe { instance.create_device(physical_device, &create_info, None) }
        .context("Failed to create logical device")?;

    Ok(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn compute_family_is_first_match() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::COMPUTE),
        ];
        assert_eq!(find_compute_queue_family(&families), Some(1));
    }

    #[test]
    fn compute_only_family_is_found() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER | vk::QueueFlags::SPARSE_BINDING),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
        ];
        assert_eq!(find_compute_queue_family(&families), Some(2));
    }

    #[test]
    fn no_compute_family_yields_none() {
        let families = [family(vk::QueueFlags::GRAPHICS), family(vk::QueueFlags::TRANSFER)];
        assert_eq!(find_compute_queue_family(&families), None);
        assert_eq!(find_compute_queue_family(&[]), None);
    }

    #[test]
    fn first_physical_device_is_selected() {
        let devices = [
            vk::PhysicalDevice::from_raw(0x10),
            vk::PhysicalDevice::from_raw(0x20),
        ];
        assert_eq!(first_physical_device(&devices).unwrap().as_raw(), 0x10);
    }

    #[test]
    fn empty_device_list_is_an_error() {
        let err = first_physical_device(&[]).unwrap_err();
        assert!(err.to_string().contains("No Vulkan physical device"));
    }
}
