// hello-compute: dispatch the embedded shader, releasing every Vulkan object
// through an explicit teardown step.

use anyhow::Result;
use vulkan_compute_sample::config::Config;
use vulkan_compute_sample::{explicit, logging};

fn main() -> Result<()> {
    // Load configuration from config.toml
    let (config, report) = Config::load();

    logging::init_logging(&config, &report)?;
    log::info!("Starting {} (explicit teardown)", config.app.name);

    explicit::run(&config)?;

    log::info!("Done");
    Ok(())
}
