// Selection policy
//
// Pure functions over the property lists Vulkan hands back. Nothing in here
// touches a live handle, so every rule can be checked without a GPU.

use ash::vk;
use super::error::{BackendError, BackendResult};

/// Format used when the surface reports `VK_FORMAT_UNDEFINED` (no preference)
pub const DEFAULT_SURFACE_FORMAT: vk::SurfaceFormatKHR = vk::SurfaceFormatKHR {
    format: vk::Format::B8G8R8A8_UNORM,
    color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
};

/// Default number of swapchain images requested before clamping
pub const DEFAULT_IMAGE_COUNT: u32 = 2;

/// Lowest-indexed queue family advertising graphics support
pub fn pick_graphics_queue_family(families: &[vk::QueueFamilyProperties]) -> BackendResult<u32> {
    families
        .iter()
        .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|index| index as u32)
        .ok_or(BackendError::NoGraphicsQueueFamily)
}

/// Surface format selection.
///
/// An undefined first entry means the surface accepts anything, so we fall
/// back to [`DEFAULT_SURFACE_FORMAT`]. Otherwise the first entry is used as-is.
pub fn pick_surface_format(formats: &[vk::SurfaceFormatKHR]) -> BackendResult<vk::SurfaceFormatKHR> {
    let first = formats.first().ok_or(BackendError::NoSurfaceFormats)?;

    if first.format == vk::Format::UNDEFINED {
        Ok(DEFAULT_SURFACE_FORMAT)
    } else {
        Ok(*first)
    }
}

/// Surface extent: a defined `current_extent` always wins over the requested size
pub fn resolve_extent(caps: &vk::SurfaceCapabilitiesKHR, requested: vk::Extent2D) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }

    vk::Extent2D {
        width: requested
            .width
            .clamp(caps.min_image_extent.width, caps.max_image_extent.width.max(caps.min_image_extent.width)),
        height: requested
            .height
            .clamp(caps.min_image_extent.height, caps.max_image_extent.height.max(caps.min_image_extent.height)),
    }
}

/// Swapchain image count.
///
/// Clamp down to the platform maximum (0 = uncapped), then up to min + 1 so
/// the driver never holds every image. A surface with `min == max` cannot
/// satisfy min + 1; the maximum is re-applied so the request stays valid.
pub fn resolve_image_count(requested: u32, caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let mut count = requested;

    if caps.max_image_count > 0 && count > caps.max_image_count {
        count = caps.max_image_count;
    }
    let floor = caps.min_image_count.saturating_add(1);
    if count < floor {
        count = floor;
    }
    if caps.max_image_count > 0 {
        count = count.min(caps.max_image_count);
    }

    count
}

/// FIFO is guaranteed to exist; Mailbox replaces it whenever advertised
pub fn pick_present_mode(modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    let mut mode = vk::PresentModeKHR::FIFO;
    for &candidate in modes {
        if candidate == vk::PresentModeKHR::MAILBOX {
            mode = candidate;
        }
    }
    mode
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    fn caps(min: u32, max: u32) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min,
            max_image_count: max,
            current_extent: vk::Extent2D { width: u32::MAX, height: u32::MAX },
            min_image_extent: vk::Extent2D { width: 1, height: 1 },
            max_image_extent: vk::Extent2D { width: 4096, height: 4096 },
            ..Default::default()
        }
    }

    #[test]
    fn graphics_family_is_lowest_index() {
        let families = [
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::GRAPHICS),
        ];
        assert_eq!(pick_graphics_queue_family(&families).unwrap(), 1);
    }

    #[test]
    fn graphics_family_missing_is_an_error() {
        let families = [
            family(vk::QueueFlags::COMPUTE),
            family(vk::QueueFlags::TRANSFER),
        ];
        assert!(matches!(
            pick_graphics_queue_family(&families),
            Err(BackendError::NoGraphicsQueueFamily)
        ));
        assert!(matches!(
            pick_graphics_queue_family(&[]),
            Err(BackendError::NoGraphicsQueueFamily)
        ));
    }

    #[test]
    fn undefined_format_falls_back_to_default() {
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::UNDEFINED,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        let chosen = pick_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_UNORM);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn first_reported_format_wins() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_SRGB,
                color_space: vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT,
            },
            DEFAULT_SURFACE_FORMAT,
        ];
        let chosen = pick_surface_format(&formats).unwrap();
        assert_eq!(chosen.format, vk::Format::R8G8B8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::DISPLAY_P3_NONLINEAR_EXT);
    }

    #[test]
    fn no_formats_is_an_error() {
        assert!(matches!(pick_surface_format(&[]), Err(BackendError::NoSurfaceFormats)));
    }

    #[test]
    fn image_count_uncapped_raises_to_min_plus_one() {
        assert_eq!(resolve_image_count(DEFAULT_IMAGE_COUNT, &caps(2, 0)), 3);
    }

    #[test]
    fn image_count_clamps_to_max() {
        assert_eq!(resolve_image_count(8, &caps(2, 3)), 3);
    }

    #[test]
    fn image_count_keeps_request_inside_bounds() {
        assert_eq!(resolve_image_count(4, &caps(1, 8)), 4);
    }

    #[test]
    fn image_count_never_exceeds_max_when_min_equals_max() {
        assert_eq!(resolve_image_count(2, &caps(3, 3)), 3);
    }

    #[test]
    fn image_count_floor_saturates_at_u32_max() {
        assert_eq!(resolve_image_count(2, &caps(u32::MAX, 0)), u32::MAX);
    }

    #[test]
    fn mailbox_preferred_when_advertised() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(pick_present_mode(&modes), vk::PresentModeKHR::MAILBOX);

        let modes = [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(pick_present_mode(&modes), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn fifo_when_mailbox_absent() {
        assert_eq!(pick_present_mode(&[vk::PresentModeKHR::FIFO]), vk::PresentModeKHR::FIFO);
        assert_eq!(
            pick_present_mode(&[vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO_RELAXED]),
            vk::PresentModeKHR::FIFO
        );
    }

    #[test]
    fn defined_current_extent_overrides_request() {
        let mut c = caps(2, 0);
        c.current_extent = vk::Extent2D { width: 1024, height: 768 };

        let extent = resolve_extent(&c, vk::Extent2D { width: 800, height: 600 });
        assert_eq!(extent, vk::Extent2D { width: 1024, height: 768 });
    }

    #[test]
    fn undefined_current_extent_uses_clamped_request() {
        let mut c = caps(2, 0);
        c.max_image_extent = vk::Extent2D { width: 640, height: 4096 };

        let extent = resolve_extent(&c, vk::Extent2D { width: 800, height: 600 });
        assert_eq!(extent, vk::Extent2D { width: 640, height: 600 });
    }
}
