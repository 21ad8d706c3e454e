// Shader compilation and module creation
//
// Vulkan consumes SPIR-V. The compute shader ships as GLSL source embedded in
// the binary and is compiled with shaderc at startup.

use crate::config::ShaderConfig;
use anyhow::{Context, Result};
use ash::vk;
use std::borrow::Cow;

/// Compute shader printing one line per invocation through debug printf
pub const HELLO_WORLD_SHADER: &str = include_str!("../../shaders/hello_world.comp");

/// GLSL source to compile: the configured file if any, the embedded shader otherwise
pub fn shader_source(config: &ShaderConfig) -> Result<Cow<'static, str>> {
    match &config.source_file {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read shader source: {}", path))?;
            log::info!("Loaded shader source from {}", path);
            Ok(Cow::Owned(source))
        }
        None => Ok(Cow::Borrowed(HELLO_WORLD_SHADER)),
    }
}

/// Compile GLSL to SPIR-V words
pub fn compile_glsl(
    source: &str,
    kind: shaderc::ShaderKind,
    file_name: &str,
    entry_point: &str,
    debug_info: bool,
) -> Result<Vec<u32>> {
    let compiler = shaderc::Compiler::new().context("Failed to initialize shader compiler")?;
    let mut options =
        shaderc::CompileOptions::new().context("Failed to create shader compile options")?;
    if debug_info {
        options.set_generate_debug_info();
    }

    let artifact = compiler
        .compile_into_spirv(source, kind, file_name, entry_point, Some(&options))
        .with_context(|| format!("Failed to compile shader {}", file_name))?;

    if artifact.get_num_warnings() > 0 {
        log::warn!("{}: {}", file_name, artifact.get_warning_messages());
    }

    let spirv = artifact.as_binary().to_vec();
    log::debug!("Compiled {} to {} SPIR-V words", file_name, spirv.len());

    Ok(spirv)
}

/// Create a shader module from SPIR-V words
pub fn create_shader_module(device: &ash::Device, spirv: &[u32]) -> Result<vk::ShaderModule> {
    let create_info = vk::ShaderModuleCreateInfo::builder().code(spirv);

    unsafe {
        device
            .create_shader_module(&create_info, None)
            .context("Failed to create shader module")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPIRV_MAGIC: u32 = 0x0723_0203;

    #[test]
    fn embedded_shader_is_used_by_default() {
        let source = shader_source(&ShaderConfig::default()).unwrap();
        assert!(matches!(source, Cow::Borrowed(_)));
        assert!(source.contains("debugPrintfEXT"));
        assert!(source.contains("GL_EXT_debug_printf"));
    }

    #[test]
    fn missing_shader_file_is_an_error() {
        let config = ShaderConfig {
            source_file: Some("shaders/does_not_exist.comp".to_string()),
            ..Default::default()
        };
        assert!(shader_source(&config).is_err());
    }

    #[test]
    fn embedded_shader_compiles_to_spirv() {
        let spirv = compile_glsl(
            HELLO_WORLD_SHADER,
            shaderc::ShaderKind::Compute,
            "hello_world.comp",
            "main",
            false,
        )
        .unwrap();

        assert_eq!(spirv[0], SPIRV_MAGIC);
        assert!(spirv.len() > 5);
    }

    #[test]
    fn compile_errors_carry_the_file_name() {
        let err = compile_glsl(
            "#version 460\nvoid main() { undefined_call(); }",
            shaderc::ShaderKind::Compute,
            "broken.comp",
            "main",
            false,
        )
        .unwrap_err();

        let message = format!("{:#}", err);
        assert!(message.contains("broken.comp"));
        // compiler diagnostic propagated beneath the context
        assert!(err.root_cause().to_string().contains("undefined_call"));
        assert!(err.downcast_ref::<shaderc::Error>().is_some());
    }
}
