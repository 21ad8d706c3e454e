// Compute pipeline creation
//
// A compute pipeline is a single shader stage plus the layout describing its
// resource bindings. The sample binds nothing, so the layout is empty.

use anyhow::{Context, Result};
use ash::vk;
use std::ffi::CString;

/// Create a pipeline layout with no descriptor sets and no push constants
pub fn create_empty_pipeline_layout(device: &ash::Device) -> Result<vk::PipelineLayout> {
    let layout_info = vk::PipelineLayoutCreateInfo::default();

    unsafe {
        device
            .create_pipeline_layout(&layout_info, None)
            .context("Failed to create pipeline layout")
    }
}

/// Create a compute pipeline running `entry_point` of `shader_module`
pub fn create_compute_pipeline(
    device: &ash::Device,
    shader_module: vk::ShaderModule,
    layout: vk::PipelineLayout,
    entry_point: &str,
) -> Result<vk::Pipeline> {
    let entry_point = CString::new(entry_point)?;

    let stage = vk::PipelineShaderStageCreateInfo::builder()
        .stage(vk::ShaderStageFlags::COMPUTE)
        .module(shader_module)
        .name(&entry_point)
        .build();

    let pipeline_info = vk::ComputePipelineCreateInfo::builder()
        .stage(stage)
        .layout(layout)
        .build();

    let pipelines = unsafe {
        device
            .create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_info], None)
            .map_err(|(_, e)| e)
            .context("Failed to create compute pipeline")?
    };

    Ok(pipelines[0])
}
