// =============================================================================
// VULKAN PLAYPEN - Minimal Vulkan bring-up
// =============================================================================
//
// STARTUP FLOW:
// 1. Load config.toml and initialize logging
// 2. Create instance, pick the first GPU and its graphics queue family,
//    open the logical device and its queue
// 3. Optionally prove the queue works (fence + semaphore round-trips)
// 4. Open a window, create its surface, negotiate and create a swapchain
// 5. Pump window events until the window asks to close
//
// Any failure on the way is a startup precondition violation: it bubbles up
// to main as an error and the process exits non-zero.
//
// =============================================================================

use anyhow::Result;
use vulkan_playpen::config::Config;
use vulkan_playpen::renderer::Renderer;

fn main() -> Result<()> {
    // Load configuration from config.toml; its status is reported once logging is up
    let (config, config_status) = Config::load();

    // Initialize logging
    init_logging(&config);
    log::info!("Starting Vulkan Playpen");
    config_status.log();
    log::debug!("Config: {:?}", config);

    let mut renderer = Renderer::new(&config)?;

    if config.debug.queue_self_test {
        renderer.run_queue_self_test()?;
    }

    let window = renderer.open_window(
        config.window.width,
        config.window.height,
        &config.window.title,
    )?;
    log::info!(
        "Window '{}' open, surface {}x{} {:?}",
        window.title(),
        window.extent().width,
        window.extent().height,
        window.surface_format().format
    );

    while renderer.run() {}

    log::info!("Window closed, exiting");
    Ok(())
}

/// Initialize logging at the configured level
fn init_logging(config: &Config) {
    use env_logger::Builder;

    let mut builder = Builder::from_default_env();
    builder.filter_level(config.log_level());
    builder.init();
}
