// =============================================================================
// VULKAN COMPUTE SAMPLE
// =============================================================================
//
// Compiles an embedded GLSL compute shader, dispatches it once on the first
// GPU and waits for it. Shader output arrives through debug printf and the
// validation layer's debug messenger.
//
// Two runs of the same sequence:
// - `explicit`: raw handles, released by an explicit teardown step
// - `scoped`:   owned wrappers, released when they go out of scope
//
// =============================================================================

pub mod backend;
pub mod config;
pub mod explicit;
pub mod logging;
pub mod scoped;
pub mod teardown;
