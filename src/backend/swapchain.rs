// Swapchain - Window presentation
//
// Manages the chain of images bound to a window surface. The configuration
// is resolved once from the surface negotiation and never changes; the
// window is not resizable, so there is no recreation path.

use ash::extensions::khr;
use ash::vk;
use std::sync::Arc;

use super::error::{BackendError, BackendResult, VkResultExt};
use super::surface::{Surface, SurfaceNegotiation};
use super::{policy, VulkanDevice};

/// Everything the swapchain is created with
#[derive(Debug, Clone, Copy)]
pub struct SwapchainConfig {
    pub image_count: u32,
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    pub present_mode: vk::PresentModeKHR,
}

impl SwapchainConfig {
    /// Apply the image count and present mode policies on top of a negotiated surface
    pub fn resolve(
        negotiation: &SurfaceNegotiation,
        present_modes: &[vk::PresentModeKHR],
        requested_image_count: u32,
    ) -> Self {
        Self {
            image_count: policy::resolve_image_count(requested_image_count, &negotiation.capabilities),
            format: negotiation.format,
            extent: negotiation.extent,
            present_mode: policy::pick_present_mode(present_modes),
        }
    }
}

pub struct Swapchain {
    swapchain: vk::SwapchainKHR,
    swapchain_loader: khr::Swapchain,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    config: SwapchainConfig,
    device: Arc<VulkanDevice>,
}

impl Swapchain {
    pub fn new(
        device: Arc<VulkanDevice>,
        surface: &Surface,
        config: SwapchainConfig,
    ) -> BackendResult<Self> {
        log::info!(
            "Creating swapchain: {}x{}, {:?}, {:?}, {} image(s) requested",
            config.extent.width,
            config.extent.height,
            config.format.format,
            config.present_mode,
            config.image_count
        );

        let swapchain_loader = khr::Swapchain::new(device.instance(), device.device());

        // Exclusive ownership by the one graphics family; no negotiation past this point
        let queue_family_indices = [device.graphics_queue_family()];
        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(config.image_count)
            .image_format(config.format.format)
            .image_color_space(config.format.color_space)
            .image_extent(config.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .queue_family_indices(&queue_family_indices)
            .pre_transform(vk::SurfaceTransformFlagsKHR::IDENTITY)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(config.present_mode)
            .clipped(true)
            .old_swapchain(vk::SwapchainKHR::null());

        let swapchain = unsafe {
            swapchain_loader.create_swapchain(&create_info, None)
        }
        .vk_context("vkCreateSwapchainKHR")?;

        // The driver may hand back more images than requested
        let images = match unsafe { swapchain_loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(result) => {
                unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(BackendError::Vulkan { call: "vkGetSwapchainImagesKHR", result });
            }
        };

        log::info!("Created swapchain with {} images", images.len());

        let mut this = Self {
            swapchain,
            swapchain_loader,
            images,
            image_views: Vec::new(),
            config,
            device,
        };

        // Views are pushed one at a time so Drop cleans up a partial set
        for i in 0..this.images.len() {
            let view = this.create_image_view(this.images[i])?;
            this.image_views.push(view);
        }

        Ok(this)
    }

    fn create_image_view(&self, image: vk::Image) -> BackendResult<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(self.config.format.format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe { self.device.device().create_image_view(&create_info, None) }
            .vk_context("vkCreateImageView")
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Number of images the driver actually created
    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    pub fn config(&self) -> &SwapchainConfig {
        &self.config
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        log::debug!("Destroying swapchain");
        unsafe {
            for &view in &self.image_views {
                self.device.device().destroy_image_view(view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}
