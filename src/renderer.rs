// =============================================================================
// RENDERER - Composition root
// =============================================================================
//
// Owns the device context and, once opened, the window. Teardown runs in
// reverse order of acquisition:
//   swapchain -> surface -> OS window -> logical device -> instance
// The window is declared first so it drops first; surfaces and swapchains
// also hold an Arc to the device, so the device cannot go away under them.

use anyhow::{Context, Result};
use ash::vk;
use std::sync::Arc;

use crate::backend::{self_test, DeviceSettings, VulkanDevice};
use crate::config::Config;
use crate::window::Window;

pub struct Renderer {
    window: Option<Window>,
    device: Arc<VulkanDevice>,
    requested_image_count: u32,
}

impl Renderer {
    pub fn new(config: &Config) -> Result<Self> {
        let settings = DeviceSettings {
            app_name: config.window.title.clone(),
            enable_validation: config.validation_enabled(),
            list_layers: config.debug.list_layers,
        };

        let device = VulkanDevice::new(&settings)
            .context("Failed to initialize Vulkan device")?;

        Ok(Self {
            window: None,
            device,
            requested_image_count: config.swapchain.image_count,
        })
    }

    /// Submit the startup fence and semaphore round-trips on the graphics queue
    pub fn run_queue_self_test(&self) -> Result<()> {
        self_test::run(&self.device).context("Queue self-test failed")
    }

    /// Open the window and bind a swapchain to it. Only one window is supported.
    pub fn open_window(&mut self, width: u32, height: u32, title: &str) -> Result<&mut Window> {
        if self.window.is_some() {
            anyhow::bail!("A window is already open");
        }

        let window = Window::open(&self.device, width, height, title, self.requested_image_count)
            .with_context(|| format!("Failed to open window '{}'", title))?;

        Ok(self.window.insert(window))
    }

    /// Pump the window once. With no window open there is nothing to stop us.
    pub fn run(&mut self) -> bool {
        match self.window.as_mut() {
            Some(window) => window.update(),
            None => true,
        }
    }

    pub fn window(&self) -> Option<&Window> {
        self.window.as_ref()
    }

    pub fn device_context(&self) -> &Arc<VulkanDevice> {
        &self.device
    }

    pub fn instance(&self) -> &ash::Instance {
        self.device.instance()
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.device.physical_device()
    }

    pub fn device(&self) -> &ash::Device {
        self.device.device()
    }

    pub fn queue(&self) -> vk::Queue {
        self.device.queue()
    }

    pub fn graphics_family_index(&self) -> u32 {
        self.device.graphics_queue_family()
    }

    pub fn physical_device_properties(&self) -> &vk::PhysicalDeviceProperties {
        self.device.physical_device_properties()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        log::info!("Shutting down renderer...");

        if let Err(e) = self.device.wait_idle() {
            log::warn!("Device did not go idle before shutdown: {}", e);
        }

        // Window resources first, the device follows when the last Arc drops
        self.window = None;
    }
}
