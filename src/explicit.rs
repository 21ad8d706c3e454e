// Explicit-teardown run
//
// Works on raw ash handles. Each handle registers its release action on a
// TeardownStack as soon as it exists; the stack is unwound explicitly once the
// dispatch has completed, or on drop if a step fails part way.

use crate::backend::{command, device, instance, pipeline, shader};
use crate::config::Config;
use crate::logging;
use crate::teardown::TeardownStack;
use anyhow::{Context, Result};
use ash::Entry;

pub fn run(config: &Config) -> Result<()> {
    config.validate()?;

    let entry = unsafe { Entry::load() }
        .context("Failed to load Vulkan library. Is Vulkan installed?")?;
    let mut teardown = TeardownStack::new();

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 1: Instance + debug messenger
    // ─────────────────────────────────────────────────────────────────────────
    let instance = instance::create_instance(&entry, config)?;
    {
        let instance = instance.clone();
        teardown.push("instance", move || unsafe { instance.destroy_instance(None) });
    }

    if config.validation.enabled {
        let (debug_utils, messenger) =
            instance::setup_debug_messenger(&entry, &instance, config.message_severity())?;
        teardown.push("debug messenger", move || unsafe {
            debug_utils.destroy_debug_utils_messenger(messenger, None)
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 2-4: Physical device, compute family, logical device
    // ─────────────────────────────────────────────────────────────────────────
    let physical_device = device::pick_physical_device(&instance)?;
    device::describe_physical_device(&instance, physical_device);
    let queue_family = device::compute_queue_family(&instance, physical_device)?;

    let device = device::create_logical_device(&instance, physical_device, queue_family)?;
    {
        let device = device.clone();
        teardown.push("logical device", move || unsafe { device.destroy_device(None) });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 5-6: Shader, layout, pipeline
    // ─────────────────────────────────────────────────────────────────────────
    let source = shader::shader_source(&config.shader)?;
    let spirv = shader::compile_glsl(
        &source,
        shaderc::ShaderKind::Compute,
        &config.shader.file_name,
        &config.compute.entry_point,
        config.shader.debug_info,
    )?;

    let shader_module = shader::create_shader_module(&device, &spirv)?;
    {
        let device = device.clone();
        teardown.push("shader module", move || unsafe {
            device.destroy_shader_module(shader_module, None)
        });
    }

    let pipeline_layout = pipeline::create_empty_pipeline_layout(&device)?;
    {
        let device = device.clone();
        teardown.push("pipeline layout", move || unsafe {
            device.destroy_pipeline_layout(pipeline_layout, None)
        });
    }

    let compute_pipeline = pipeline::create_compute_pipeline(
        &device,
        shader_module,
        pipeline_layout,
        &config.compute.entry_point,
    )?;
    {
        let device = device.clone();
        teardown.push("compute pipeline", move || unsafe {
            device.destroy_pipeline(compute_pipeline, None)
        });
    }

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 7: Command pool + buffer, record bind + dispatch
    // ─────────────────────────────────────────────────────────────────────────
    let command_pool = command::create_command_pool(&device, queue_family)?;
    {
        let device = device.clone();
        teardown.push("command pool", move || unsafe {
            device.destroy_command_pool(command_pool, None)
        });
    }

    let command_buffer = command::allocate_primary_command_buffer(&device, command_pool)?;
    {
        let device = device.clone();
        teardown.push("command buffer", move || unsafe {
            device.free_command_buffers(command_pool, &[command_buffer])
        });
    }

    command::record_dispatch(&device, command_buffer, compute_pipeline, config.compute.group_count)?;

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 8: Submit and wait
    // ─────────────────────────────────────────────────────────────────────────
    let queue = unsafe { device.get_device_queue(queue_family, 0) };
    if let Err(e) = command::submit_and_wait(&device, queue, command_buffer) {
        // The command buffer may still be pending; drain the queue before the
        // teardown stack frees it on drop.
        let drained = unsafe { device.device_wait_idle() }.context("Failed waiting for device idle");
        logging::warn_on_error("Draining the queue before teardown", drained);
        return Err(e);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // STEP 9: Release everything, newest first
    // ─────────────────────────────────────────────────────────────────────────
    log::info!("Releasing {} Vulkan objects", teardown.len());
    teardown.unwind();

    Ok(())
}
