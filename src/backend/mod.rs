// Backend module - Vulkan compute layer
//
// Design: Thin functions over ash for each step of a compute dispatch,
// plus owned wrappers that release their handle on drop.

pub mod command;
pub mod device;
pub mod instance;
pub mod owned;
pub mod pipeline;
pub mod shader;
