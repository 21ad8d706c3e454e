// Scoped-teardown run
//
// Same sequence as `explicit::run`, built from owned wrappers. Locals drop in
// reverse declaration order and every wrapper holds its parent through an Arc,
// so leaving the function (normally or through `?`) releases everything.

use crate::backend::owned::{
    CommandPool, ComputePipeline, DebugMessenger, Device, Instance, PipelineLayout, ShaderModule,
};
use crate::backend::{device, shader};
use crate::config::Config;
use anyhow::Result;

pub fn run(config: &Config) -> Result<()> {
    config.validate()?;

    let instance = Instance::new(config)?;
    let _debug_messenger = if config.validation.enabled {
        Some(DebugMessenger::new(&instance, config.message_severity())?)
    } else {
        None
    };

    let physical_device = instance.first_physical_device()?;
    let queue_family = device::compute_queue_family(instance.raw(), physical_device)?;
    let device = Device::new(&instance, physical_device, queue_family)?;

    let source = shader::shader_source(&config.shader)?;
    let spirv = shader::compile_glsl(
        &source,
        shaderc::ShaderKind::Compute,
        &config.shader.file_name,
        &config.compute.entry_point,
        config.shader.debug_info,
    )?;
    let shader_module = ShaderModule::new(&device, &spirv)?;
    let pipeline_layout = PipelineLayout::new_empty(&device)?;
    let pipeline = ComputePipeline::new(&pipeline_layout, &shader_module, &config.compute.entry_point)?;

    let command_pool = CommandPool::new(&device)?;
    let command_buffer = command_pool.allocate_primary()?;
    command_buffer.record_dispatch(&pipeline, config.compute.group_count)?;
    command_buffer.submit_and_wait()?;

    log::info!("Releasing Vulkan objects");
    Ok(())
}
