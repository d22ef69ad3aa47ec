// Backend module - Vulkan bring-up
//
// Design: thin wrappers around ash; selection policy kept pure in `policy`
// so it can be tested without a GPU.

pub mod device;
pub mod error;
pub mod platform;
pub mod policy;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use device::{DeviceSettings, VulkanDevice};
pub use error::{BackendError, BackendResult};
pub use surface::{negotiate_surface, Surface, SurfaceNegotiation, SurfaceSupport};
pub use swapchain::{Swapchain, SwapchainConfig};
