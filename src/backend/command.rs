// Command recording and submission
//
// One primary command buffer, recorded once, submitted once, then the host
// blocks until the device is idle.

use anyhow::{Context, Result};
use ash::vk;

pub fn create_command_pool(device: &ash::Device, queue_family: u32) -> Result<vk::CommandPool> {
    let pool_info = vk::CommandPoolCreateInfo::builder().queue_family_index(queue_family);

    unsafe {
        device
            .create_command_pool(&pool_info, None)
            .context("Failed to create command pool")
    }
}

pub fn allocate_primary_command_buffer(
    device: &ash::Device,
    command_pool: vk::CommandPool,
) -> Result<vk::CommandBuffer> {
    let alloc_info = vk::CommandBufferAllocateInfo::builder()
        .command_pool(command_pool)
        .level(vk::CommandBufferLevel::PRIMARY)
        .command_buffer_count(1);

    let command_buffers = unsafe { device.allocate_command_buffers(&alloc_info) }
        .context("Failed to allocate command buffer")?;

    command_buffers
        .into_iter()
        .next()
        .context("Driver returned no command buffer")
}

/// Record bind + dispatch of `group_count` workgroups
pub fn record_dispatch(
    device: &ash::Device,
    command_buffer: vk::CommandBuffer,
    pipeline: vk::Pipeline,
    group_count: [u32; 3],
) -> Result<()> {
    let [x, y, z] = group_count;

    unsafe {
        let begin_info = vk::CommandBufferBeginInfo::builder();
        device
            .begin_command_buffer(command_buffer, &begin_info)
            .context("Failed to begin command buffer")?;

        device.cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::COMPUTE, pipeline);
        device.cmd_dispatch(command_buffer, x, y, z);

        device
            .end_command_buffer(command_buffer)
            .context("Failed to end command buffer")?;
    }

    log::info!("Recorded dispatch of {}x{}x{} workgroups", x, y, z);
    Ok(())
}

/// Submit to `queue` without semaphores or fence, then wait for the device to go idle
pub fn submit_and_wait(
    device: &ash::Device,
    queue: vk::Queue,
    command_buffer: vk::CommandBuffer,
) -> Result<()> {
    let command_buffers = [command_buffer];
    let submit_info = vk::SubmitInfo::builder().command_buffers(&command_buffers);

    unsafe {
        device
            .queue_submit(queue, &[submit_info.build()], vk::Fence::null())
            .context("Failed to submit command buffer")?;
        device
            .device_wait_idle()
            .context("Failed waiting for device idle")?;
    }

    log::info!("Dispatch complete");
    Ok(())
}
