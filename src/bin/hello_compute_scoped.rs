// hello-compute-scoped: same dispatch, every Vulkan object released when it
// goes out of scope.

use anyhow::Result;
use vulkan_compute_sample::config::Config;
use vulkan_compute_sample::{logging, scoped};

fn main() -> Result<()> {
    let (config, report) = Config::load();

    logging::init_logging(&config, &report)?;
    log::info!("Starting {} (scoped teardown)", config.app.name);

    scoped::run(&config)?;

    log::info!("Done");
    Ok(())
}
