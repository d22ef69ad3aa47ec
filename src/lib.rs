//! Minimal Vulkan bring-up: instance, first GPU, graphics queue, a window
//! with its surface, and a swapchain negotiated against that surface.
//!
//! [`renderer::Renderer`] is the entry point; the selection rules live in
//! [`backend::policy`] and can be exercised without a GPU.

pub mod backend;
pub mod config;
pub mod renderer;
pub mod window;
