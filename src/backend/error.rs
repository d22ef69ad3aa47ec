// Backend errors
//
// Every failure in device selection and surface negotiation is a startup
// precondition violation. They are returned as values; only `main` decides
// to terminate.

use ash::vk;
use std::ffi::NulError;
use thiserror::Error;

/// Errors raised while bringing up the Vulkan device, surface and swapchain
#[derive(Error, Debug)]
pub enum BackendError {
    /// The Vulkan loader library could not be found or opened
    #[error("Failed to load Vulkan library")]
    Loading(#[from] ash::LoadingError),

    /// An application or layer name contained an interior NUL byte
    #[error("Name contains an interior NUL byte")]
    InvalidName(#[from] NulError),

    /// A Vulkan call returned a non-success status
    #[error("{call} failed: {result:?}")]
    Vulkan {
        call: &'static str,
        result: vk::Result,
    },

    #[error("No Vulkan-capable GPU found")]
    NoPhysicalDevice,

    #[error("No queue family with VK_QUEUE_GRAPHICS_BIT set")]
    NoGraphicsQueueFamily,

    #[error("Queue family {queue_family} cannot present to this surface")]
    PresentationUnsupported { queue_family: u32 },

    #[error("Surface reported no formats")]
    NoSurfaceFormats,

    /// The window handle belongs to a platform this build cannot create surfaces for
    #[error("Unsupported window platform: {0}")]
    UnsupportedPlatform(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Attach the name of the failing Vulkan call to a raw `vk::Result`
pub trait VkResultExt<T> {
    fn vk_context(self, call: &'static str) -> BackendResult<T>;
}

impl<T> VkResultExt<T> for Result<T, vk::Result> {
    fn vk_context(self, call: &'static str) -> BackendResult<T> {
        self.map_err(|result| BackendError::Vulkan { call, result })
    }
}
