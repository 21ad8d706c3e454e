// Owned Vulkan objects with automatic cleanup
//
// Each wrapper owns one handle and destroys it in `Drop`. Wrappers keep the
// object they were created from alive through an `Arc`, so a parent can never
// be destroyed while a child still exists.

use super::{command, device, instance, pipeline, shader};
use crate::config::Config;
use anyhow::{Context, Result};
use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

pub struct Instance {
    raw: ash::Instance,
    entry: Entry,
}

impl Instance {
    pub fn new(config: &Config) -> Result<Arc<Self>> {
        let entry = unsafe { Entry::load() }
            .context("Failed to load Vulkan library. Is Vulkan installed?")?;
        let raw = instance::create_instance(&entry, config)?;

        Ok(Arc::new(Self { raw, entry }))
    }

    pub fn raw(&self) -> &ash::Instance {
        &self.raw
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn first_physical_device(&self) -> Result<vk::PhysicalDevice> {
        let physical_device = device::pick_physical_device(&self.raw)?;
        device::describe_physical_device(&self.raw, physical_device);
        Ok(physical_device)
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("handle", &self.raw.handle())
            .finish_non_exhaustive()
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        log::debug!("Destroying instance");
        // SAFETY: every child holds an Arc to this instance, so none is left.
        unsafe { self.raw.destroy_instance(None) };
    }
}

// ---------------------------------------------------------------------------
// DebugMessenger
// ---------------------------------------------------------------------------

pub struct DebugMessenger {
    loader: DebugUtils,
    handle: vk::DebugUtilsMessengerEXT,
    _parent: Arc<Instance>,
}

impl DebugMessenger {
    pub fn new(
        instance: &Arc<Instance>,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    ) -> Result<Arc<Self>> {
        let (loader, handle) =
            instance::setup_debug_messenger(instance.entry(), instance.raw(), severity)?;

        Ok(Arc::new(Self {
            loader,
            handle,
            _parent: Arc::clone(instance),
        }))
    }
}

impl std::fmt::Debug for DebugMessenger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DebugMessenger")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        log::debug!("Destroying debug messenger {:?}", self.handle);
        // SAFETY: handle was created by this loader; `_parent` keeps the instance alive.
        unsafe { self.loader.destroy_debug_utils_messenger(self.handle, None) };
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// Logical device with its single compute queue
pub struct Device {
    raw: ash::Device,
    queue: vk::Queue,
    queue_family: u32,
    _parent: Arc<Instance>,
}

impl Device {
    pub fn new(
        instance: &Arc<Instance>,
        physical_device: vk::PhysicalDevice,
        queue_family: u32,
    ) -> Result<Arc<Self>> {
        let raw = device::create_logical_device(instance.raw(), physical_device, queue_family)?;
        let queue = unsafe { raw.get_device_queue(queue_family, 0) };

        Ok(Arc::new(Self {
            raw,
            queue,
            queue_family,
            _parent: Arc::clone(instance),
        }))
    }

    pub fn raw(&self) -> &ash::Device {
        &self.raw
    }

    pub fn queue(&self) -> vk::Queue {
        self.queue
    }

    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.raw.device_wait_idle() }.context("Failed waiting for device idle")
    }
}

impl std::fmt::Debug for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device")
            .field("handle", &self.raw.handle())
            .field("queue_family", &self.queue_family)
            .finish_non_exhaustive()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        log::debug!("Destroying logical device");
        crate::logging::warn_on_error("Waiting for device idle before destroy", self.wait_idle());
        // SAFETY: every object created from this device holds an Arc to it.
        unsafe { self.raw.destroy_device(None) };
    }
}

// ---------------------------------------------------------------------------
// ShaderModule
// ---------------------------------------------------------------------------

pub struct ShaderModule {
    parent: Arc<Device>,
    handle: vk::ShaderModule,
}

impl ShaderModule {
    pub fn new(device: &Arc<Device>, spirv: &[u32]) -> Result<Self> {
        let handle = shader::create_shader_module(device.raw(), spirv)?;
        Ok(Self {
            parent: Arc::clone(device),
            handle,
        })
    }

    pub fn raw_handle(&self) -> vk::ShaderModule {
        self.handle
    }
}

impl std::fmt::Debug for ShaderModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderModule")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        log::debug!("Destroying shader module {:?}", self.handle);
        unsafe { self.parent.raw().destroy_shader_module(self.handle, None) };
    }
}

// ---------------------------------------------------------------------------
// PipelineLayout
// ---------------------------------------------------------------------------

pub struct PipelineLayout {
    parent: Arc<Device>,
    handle: vk::PipelineLayout,
}

impl PipelineLayout {
    pub fn new_empty(device: &Arc<Device>) -> Result<Arc<Self>> {
        let handle = pipeline::create_empty_pipeline_layout(device.raw())?;
        Ok(Arc::new(Self {
            parent: Arc::clone(device),
            handle,
        }))
    }

    pub fn raw_handle(&self) -> vk::PipelineLayout {
        self.handle
    }
}

impl std::fmt::Debug for PipelineLayout {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineLayout")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        log::debug!("Destroying pipeline layout {:?}", self.handle);
        // SAFETY: pipelines using this layout hold an Arc to it and are gone.
        unsafe { self.parent.raw().destroy_pipeline_layout(self.handle, None) };
    }
}

// ---------------------------------------------------------------------------
// ComputePipeline
// ---------------------------------------------------------------------------

pub struct ComputePipeline {
    layout: Arc<PipelineLayout>,
    handle: vk::Pipeline,
}

impl ComputePipeline {
    pub fn new(
        layout: &Arc<PipelineLayout>,
        shader_module: &ShaderModule,
        entry_point: &str,
    ) -> Result<Self> {
        let handle = pipeline::create_compute_pipeline(
            layout.parent.raw(),
            shader_module.raw_handle(),
            layout.raw_handle(),
            entry_point,
        )?;

        Ok(Self {
            layout: Arc::clone(layout),
            handle,
        })
    }

    pub fn raw_handle(&self) -> vk::Pipeline {
        self.handle
    }
}

impl std::fmt::Debug for ComputePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputePipeline")
            .field("handle", &self.handle)
            .field("layout", &self.layout.handle)
            .finish()
    }
}

impl Drop for ComputePipeline {
    fn drop(&mut self) {
        log::debug!("Destroying compute pipeline {:?}", self.handle);
        unsafe { self.layout.parent.raw().destroy_pipeline(self.handle, None) };
    }
}

// ---------------------------------------------------------------------------
// CommandPool / CommandBuffer
// ---------------------------------------------------------------------------

pub struct CommandPool {
    parent: Arc<Device>,
    handle: vk::CommandPool,
}

impl CommandPool {
    /// Pool on the device's compute queue family
    pub fn new(device: &Arc<Device>) -> Result<Arc<Self>> {
        let handle = command::create_command_pool(device.raw(), device.queue_family())?;
        Ok(Arc::new(Self {
            parent: Arc::clone(device),
            handle,
        }))
    }

    pub fn allocate_primary(self: &Arc<Self>) -> Result<CommandBuffer> {
        let handle = command::allocate_primary_command_buffer(self.parent.raw(), self.handle)?;
        Ok(CommandBuffer {
            pool: Arc::clone(self),
            handle,
        })
    }
}

impl std::fmt::Debug for CommandPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandPool")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        log::debug!("Destroying command pool {:?}", self.handle);
        // SAFETY: command buffers hold an Arc to the pool and have been freed.
        unsafe { self.parent.raw().destroy_command_pool(self.handle, None) };
    }
}

/// Primary command buffer, freed back to its pool on drop
pub struct CommandBuffer {
    pool: Arc<CommandPool>,
    handle: vk::CommandBuffer,
}

impl CommandBuffer {
    pub fn record_dispatch(&self, pipeline: &ComputePipeline, group_count: [u32; 3]) -> Result<()> {
        command::record_dispatch(
            self.pool.parent.raw(),
            self.handle,
            pipeline.raw_handle(),
            group_count,
        )
    }

    /// Submit to the device's compute queue and block until the device is idle
    pub fn submit_and_wait(&self) -> Result<()> {
        let device = &self.pool.parent;
        command::submit_and_wait(device.raw(), device.queue(), self.handle)
    }
}

impl std::fmt::Debug for CommandBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBuffer")
            .field("handle", &self.handle)
            .field("pool", &self.pool.handle)
            .finish()
    }
}

impl Drop for CommandBuffer {
    fn drop(&mut self) {
        log::debug!("Freeing command buffer {:?}", self.handle);
        unsafe {
            self.pool
                .parent
                .raw()
                .free_command_buffers(self.pool.handle, &[self.handle])
        };
    }
}
