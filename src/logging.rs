// Logging setup shared by both binaries

use crate::config::{Config, LoadReport};
use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use std::fs::OpenOptions;
use std::io::Write;

/// Initialize logging, optionally piping everything into the configured log file,
/// then emit the messages collected while the config was loaded.
///
/// The configured level is the default; `RUST_LOG` still wins when set.
pub fn init_logging(config: &Config, report: &LoadReport) -> Result<()> {
    let mut builder = Builder::new();
    builder.filter_level(config.log_level_filter());
    builder.parse_default_env();

    if config.debug.log_to_file {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&config.debug.log_file)
            .with_context(|| format!("Failed to open log file: {}", config.debug.log_file))?;

        writeln!(file, "=== Vulkan Compute Log ===")?;
        writeln!(file, "Started: {:?}", std::time::SystemTime::now())?;
        writeln!(file)?;

        builder.target(Target::Pipe(Box::new(file)));
    }

    builder
        .try_init()
        .context("Logger was already initialized")?;

    for (level, message) in report {
        log::log!(*level, "{}", message);
    }

    Ok(())
}

/// Log a failed step at `warn` and carry on; used where teardown must proceed anyway.
/// Returns whether the step failed.
pub fn warn_on_error(what: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => false,
        Err(e) => {
            log::warn!("{} failed: {:#}", what, e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_steps_are_reported() {
        assert!(warn_on_error(
            "Waiting for device idle",
            Err(anyhow::anyhow!("ERROR_DEVICE_LOST"))
        ));
        assert!(!warn_on_error("Waiting for device idle", Ok(())));
    }
}
