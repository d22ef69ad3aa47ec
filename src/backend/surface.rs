// Surface - the window's drawable target and what it supports
//
// `SurfaceSupport` is the query seam: the live `Surface` answers through
// VK_KHR_surface, tests answer with canned property lists.

use ash::extensions::khr;
use ash::vk;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::sync::Arc;

use super::error::{BackendError, BackendResult, VkResultExt};
use super::{platform, policy, VulkanDevice};

/// What a physical device can do with a particular surface
pub trait SurfaceSupport {
    fn presentation_supported(&self, physical_device: vk::PhysicalDevice, queue_family: u32) -> BackendResult<bool>;

    fn capabilities(&self, physical_device: vk::PhysicalDevice) -> BackendResult<vk::SurfaceCapabilitiesKHR>;

    fn formats(&self, physical_device: vk::PhysicalDevice) -> BackendResult<Vec<vk::SurfaceFormatKHR>>;

    fn present_modes(&self, physical_device: vk::PhysicalDevice) -> BackendResult<Vec<vk::PresentModeKHR>>;
}

/// Outcome of surface negotiation, fixed for the lifetime of the swapchain
#[derive(Debug, Clone, Copy)]
pub struct SurfaceNegotiation {
    pub format: vk::SurfaceFormatKHR,
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Surface size; the platform's current extent when it reports one
    pub extent: vk::Extent2D,
}

/// Verify presentation support, then settle format and extent for the surface
pub fn negotiate_surface(
    support: &impl SurfaceSupport,
    physical_device: vk::PhysicalDevice,
    queue_family: u32,
    requested: vk::Extent2D,
) -> BackendResult<SurfaceNegotiation> {
    if !support.presentation_supported(physical_device, queue_family)? {
        return Err(BackendError::PresentationUnsupported { queue_family });
    }

    let capabilities = support.capabilities(physical_device)?;
    let extent = policy::resolve_extent(&capabilities, requested);
    if extent != requested {
        log::info!(
            "Surface size {}x{} overrides requested {}x{}",
            extent.width, extent.height, requested.width, requested.height
        );
    }

    let formats = support.formats(physical_device)?;
    let format = policy::pick_surface_format(&formats)?;
    log::debug!("Surface offers {} format(s), using {:?} / {:?}", formats.len(), format.format, format.color_space);

    Ok(SurfaceNegotiation {
        format,
        capabilities,
        extent,
    })
}

/// A `VkSurfaceKHR` bound to a native window
pub struct Surface {
    surface: vk::SurfaceKHR,
    surface_loader: khr::Surface,
    _device: Arc<VulkanDevice>,
}

impl Surface {
    /// Create a surface for a native window using the matching platform.
    ///
    /// # Safety
    /// The handles must belong to a live window that outlives the surface.
    pub unsafe fn new(
        device: Arc<VulkanDevice>,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> BackendResult<Self> {
        let platform = platform::select_platform(display, device.enabled_instance_extensions())?;
        let surface = platform.create_surface(device.entry(), device.instance(), display, window)?;
        let surface_loader = khr::Surface::new(device.entry(), device.instance());

        log::info!("Created surface via {}", platform.extension().to_string_lossy());

        Ok(Self {
            surface,
            surface_loader,
            _device: device,
        })
    }

    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }
}

impl SurfaceSupport for Surface {
    fn presentation_supported(&self, physical_device: vk::PhysicalDevice, queue_family: u32) -> BackendResult<bool> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_support(physical_device, queue_family, self.surface)
        }
        .vk_context("vkGetPhysicalDeviceSurfaceSupportKHR")
    }

    fn capabilities(&self, physical_device: vk::PhysicalDevice) -> BackendResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
        }
        .vk_context("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")
    }

    fn formats(&self, physical_device: vk::PhysicalDevice) -> BackendResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)
        }
        .vk_context("vkGetPhysicalDeviceSurfaceFormatsKHR")
    }

    fn present_modes(&self, physical_device: vk::PhysicalDevice) -> BackendResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            self.surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
        }
        .vk_context("vkGetPhysicalDeviceSurfacePresentModesKHR")
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        log::debug!("Destroying surface");
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Canned surface answers for exercising negotiation without a GPU
    pub(crate) struct FakeSurface {
        pub presentable_families: Vec<u32>,
        pub capabilities: vk::SurfaceCapabilitiesKHR,
        pub formats: Vec<vk::SurfaceFormatKHR>,
        pub present_modes: Vec<vk::PresentModeKHR>,
    }

    impl Default for FakeSurface {
        fn default() -> Self {
            Self {
                presentable_families: vec![0],
                capabilities: vk::SurfaceCapabilitiesKHR {
                    min_image_count: 2,
                    max_image_count: 0,
                    current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
                    min_image_extent: vk::Extent2D { width: 1, height: 1 },
                    max_image_extent: vk::Extent2D { width: 8192, height: 8192 },
                    ..Default::default()
                },
                formats: vec![vk::SurfaceFormatKHR {
                    format: vk::Format::B8G8R8A8_SRGB,
                    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
                }],
                present_modes: vec![vk::PresentModeKHR::FIFO],
            }
        }
    }

    impl SurfaceSupport for FakeSurface {
        fn presentation_supported(&self, _: vk::PhysicalDevice, queue_family: u32) -> BackendResult<bool> {
            Ok(self.presentable_families.contains(&queue_family))
        }

        fn capabilities(&self, _: vk::PhysicalDevice) -> BackendResult<vk::SurfaceCapabilitiesKHR> {
            Ok(self.capabilities)
        }

        fn formats(&self, _: vk::PhysicalDevice) -> BackendResult<Vec<vk::SurfaceFormatKHR>> {
            Ok(self.formats.clone())
        }

        fn present_modes(&self, _: vk::PhysicalDevice) -> BackendResult<Vec<vk::PresentModeKHR>> {
            Ok(self.present_modes.clone())
        }
    }

    const REQUESTED: vk::Extent2D = vk::Extent2D { width: 800, height: 600 };

    #[test]
    fn negotiation_requires_presentation_support() {
        let surface = FakeSurface {
            presentable_families: vec![1],
            ..Default::default()
        };

        let result = negotiate_surface(&surface, vk::PhysicalDevice::null(), 0, REQUESTED);
        assert!(matches!(
            result,
            Err(BackendError::PresentationUnsupported { queue_family: 0 })
        ));
    }

    #[test]
    fn negotiation_adopts_first_format_and_requested_size() {
        let surface = FakeSurface::default();

        let negotiated = negotiate_surface(&surface, vk::PhysicalDevice::null(), 0, REQUESTED).unwrap();
        assert_eq!(negotiated.format.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(negotiated.extent, REQUESTED);
    }

    #[test]
    fn negotiation_uses_platform_extent() {
        let mut surface = FakeSurface::default();
        surface.capabilities.current_extent = vk::Extent2D { width: 1920, height: 1080 };

        let negotiated = negotiate_surface(&surface, vk::PhysicalDevice::null(), 0, REQUESTED).unwrap();
        assert_eq!(negotiated.extent, vk::Extent2D { width: 1920, height: 1080 });
    }

    #[test]
    fn negotiation_substitutes_default_for_undefined_format() {
        let surface = FakeSurface {
            formats: vec![vk::SurfaceFormatKHR {
                format: vk::Format::UNDEFINED,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            }],
            ..Default::default()
        };

        let negotiated = negotiate_surface(&surface, vk::PhysicalDevice::null(), 0, REQUESTED).unwrap();
        assert_eq!(negotiated.format.format, policy::DEFAULT_SURFACE_FORMAT.format);
        assert_eq!(negotiated.format.color_space, policy::DEFAULT_SURFACE_FORMAT.color_space);
    }

    #[test]
    fn negotiation_fails_without_formats() {
        let surface = FakeSurface {
            formats: Vec::new(),
            ..Default::default()
        };

        assert!(matches!(
            negotiate_surface(&surface, vk::PhysicalDevice::null(), 0, REQUESTED),
            Err(BackendError::NoSurfaceFormats)
        ));
    }
}
