// =============================================================================
// WINDOW - OS window, its surface and its swapchain
// =============================================================================
//
// The window is driven by pumping winit's event loop once per call to
// `update()` instead of handing control to `run_app`, so main can drive
// it with a plain `while renderer.run() {}` loop.
//
// Field order is drop order: swapchain, surface, OS window, event loop.

use ash::vk;
use raw_window_handle::{HandleError, HasDisplayHandle, HasWindowHandle};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use winit::{
    application::ApplicationHandler,
    error::{EventLoopError, OsError},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Window as OsWindow, WindowAttributes, WindowId},
};

use crate::backend::{
    negotiate_surface, BackendError, Surface, SurfaceSupport, Swapchain, SwapchainConfig, VulkanDevice,
};

/// Pumps allowed for the platform to deliver `resumed` after startup
const MAX_STARTUP_PUMPS: u32 = 100;
const STARTUP_PUMP_TIMEOUT: Duration = Duration::from_millis(10);

#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Event loop error")]
    EventLoop(#[from] EventLoopError),

    #[error("Failed to create OS window")]
    Os(#[from] OsError),

    #[error("Failed to get native window handle")]
    Handle(#[from] HandleError),

    #[error("Window size must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },

    #[error("Event loop exited with code {0} before the window opened")]
    ExitedDuringStartup(i32),

    #[error("Platform never resumed the application; no window was created")]
    NeverResumed,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Receives winit callbacks; owns the OS window once it exists
struct WindowHandler {
    attributes: Option<WindowAttributes>,
    window: Option<OsWindow>,
    create_error: Option<OsError>,
    should_run: bool,
}

impl ApplicationHandler for WindowHandler {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let Some(attributes) = self.attributes.take() else {
            return;
        };

        match event_loop.create_window(attributes) {
            Ok(window) => self.window = Some(window),
            Err(e) => {
                self.create_error = Some(e);
                self.should_run = false;
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested");
                self.should_run = false;
            }
            // Fixed-size window; the swapchain is never recreated
            WindowEvent::Resized(size) => {
                log::debug!("Ignoring resize to {}x{}", size.width, size.height);
            }
            _ => {}
        }
    }
}

pub struct Window {
    swapchain: Swapchain,
    surface: Surface,
    handler: WindowHandler,
    event_loop: EventLoop<()>,
    title: String,
}

impl Window {
    /// Open a fixed-size window and bind a surface and swapchain to it
    pub fn open(
        device: &Arc<VulkanDevice>,
        width: u32,
        height: u32,
        title: &str,
        requested_image_count: u32,
    ) -> Result<Self, WindowError> {
        if width == 0 || height == 0 {
            return Err(WindowError::ZeroSize { width, height });
        }

        log::info!("Opening window '{}' ({}x{})", title, width, height);

        let mut event_loop = EventLoop::new()?;
        let mut handler = WindowHandler {
            attributes: Some(
                WindowAttributes::default()
                    .with_title(title)
                    .with_inner_size(winit::dpi::PhysicalSize::new(width, height))
                    .with_resizable(false),
            ),
            window: None,
            create_error: None,
            should_run: true,
        };

        // Desktop platforms deliver `resumed` on the first pump
        let mut pumps = 0;
        while handler.window.is_none() {
            if let Some(e) = handler.create_error.take() {
                return Err(e.into());
            }
            if pumps == MAX_STARTUP_PUMPS {
                return Err(WindowError::NeverResumed);
            }
            if let PumpStatus::Exit(code) = event_loop.pump_app_events(Some(STARTUP_PUMP_TIMEOUT), &mut handler) {
                return Err(WindowError::ExitedDuringStartup(code));
            }
            pumps += 1;
        }

        let (surface, swapchain) = {
            let os_window = handler.window.as_ref().ok_or(WindowError::NeverResumed)?;
            let display = os_window.display_handle()?.as_raw();
            let window = os_window.window_handle()?.as_raw();

            // The OS window lives in `handler`, which is dropped after the surface
            let surface = unsafe { Surface::new(device.clone(), display, window) }?;
            let swapchain = Self::create_swapchain(device, &surface, width, height, requested_image_count)?;
            (surface, swapchain)
        };

        Ok(Self {
            swapchain,
            surface,
            handler,
            event_loop,
            title: title.to_string(),
        })
    }

    fn create_swapchain(
        device: &Arc<VulkanDevice>,
        surface: &Surface,
        width: u32,
        height: u32,
        requested_image_count: u32,
    ) -> Result<Swapchain, BackendError> {
        let physical_device = device.physical_device();

        let negotiation = negotiate_surface(
            surface,
            physical_device,
            device.graphics_queue_family(),
            vk::Extent2D { width, height },
        )?;
        let present_modes = surface.present_modes(physical_device)?;
        let config = SwapchainConfig::resolve(&negotiation, &present_modes, requested_image_count);

        let swapchain = Swapchain::new(device.clone(), surface, config)?;
        log::info!(
            "Swapchain ready: {}x{} {:?}, {} image(s)",
            config.extent.width,
            config.extent.height,
            config.present_mode,
            swapchain.image_count()
        );

        Ok(swapchain)
    }

    /// Process pending OS events without blocking.
    ///
    /// Returns `false` once the window has asked to close.
    pub fn update(&mut self) -> bool {
        if !self.handler.should_run {
            return false;
        }

        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(Some(Duration::ZERO), &mut self.handler) {
            log::info!("Event loop exited with code {}", code);
            self.handler.should_run = false;
        }

        self.handler.should_run
    }

    /// Stop the window; the next `update()` returns `false`
    pub fn close(&mut self) {
        self.handler.should_run = false;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Actual drawable size, after the platform had its say
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.config().extent
    }

    pub fn surface_format(&self) -> vk::SurfaceFormatKHR {
        self.swapchain.config().format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_size_error_reports_dimensions() {
        let err = WindowError::ZeroSize { width: 0, height: 600 };
        assert_eq!(err.to_string(), "Window size must be non-zero, got 0x600");
    }

    #[test]
    fn backend_errors_pass_through_unchanged() {
        let err: WindowError = BackendError::NoSurfaceFormats.into();
        assert_eq!(err.to_string(), BackendError::NoSurfaceFormats.to_string());
    }

    #[test]
    fn handle_error_is_reported_once() {
        use std::error::Error;

        let err = WindowError::from(HandleError::Unavailable);

        assert_eq!(err.to_string(), "Failed to get native window handle");
        assert_eq!(
            err.source().unwrap().to_string(),
            HandleError::Unavailable.to_string()
        );
    }
}
