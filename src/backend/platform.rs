// Platform surfaces
//
// One `SurfacePlatform` per window system this target can present to. The
// list is fixed at compile time; the instance enables whichever extensions
// the loader actually advertises, and a window picks the implementation
// matching its display handle.

use ash::extensions::khr;
use ash::{vk, Entry, Instance};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::CStr;

use super::error::{BackendError, BackendResult, VkResultExt};

/// Window-system specific surface creation
pub trait SurfacePlatform {
    /// Instance extension required to create surfaces for this platform
    fn extension(&self) -> &'static CStr;

    /// Whether this platform handles windows living on `display`
    fn accepts(&self, display: RawDisplayHandle) -> bool;

    /// Create a `VkSurfaceKHR` for the given native window.
    ///
    /// # Safety
    /// The handles must refer to a live window that outlives the surface.
    unsafe fn create_surface(
        &self,
        entry: &Entry,
        instance: &Instance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> BackendResult<vk::SurfaceKHR>;
}

/// Every surface platform compiled into this build
pub fn native_platforms() -> Vec<Box<dyn SurfacePlatform>> {
    #[allow(unused_mut)]
    let mut platforms: Vec<Box<dyn SurfacePlatform>> = Vec::new();

    #[cfg(target_os = "windows")]
    platforms.push(Box::new(win32::Win32Platform));

    #[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
    {
        platforms.push(Box::new(unix::XlibPlatform));
        platforms.push(Box::new(unix::WaylandPlatform));
    }

    platforms
}

/// Instance extensions for presentation: `VK_KHR_surface` plus every platform
/// surface extension the loader reports as available
pub fn surface_instance_extensions(entry: &Entry) -> BackendResult<Vec<&'static CStr>> {
    #[allow(unused_unsafe)]
    let available = unsafe { entry.enumerate_instance_extension_properties(None) }
        .vk_context("vkEnumerateInstanceExtensionProperties")?;

    let is_available = |name: &CStr| {
        available
            .iter()
            .any(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()) } == name)
    };

    let mut extensions = vec![khr::Surface::name()];
    for platform in native_platforms() {
        if is_available(platform.extension()) {
            extensions.push(platform.extension());
        } else {
            log::debug!("Surface extension {:?} not offered by loader", platform.extension());
        }
    }

    Ok(extensions)
}

/// Pick the platform matching `display` whose extension was enabled on the instance
pub fn select_platform(
    display: RawDisplayHandle,
    enabled_extensions: &[&CStr],
) -> BackendResult<Box<dyn SurfacePlatform>> {
    native_platforms()
        .into_iter()
        .find(|platform| platform.accepts(display) && enabled_extensions.contains(&platform.extension()))
        .ok_or_else(|| BackendError::UnsupportedPlatform(format!("{:?}", display)))
}

#[cfg(target_os = "windows")]
mod win32 {
    use super::*;

    pub struct Win32Platform;

    impl SurfacePlatform for Win32Platform {
        fn extension(&self) -> &'static CStr {
            khr::Win32Surface::name()
        }

        fn accepts(&self, display: RawDisplayHandle) -> bool {
            matches!(display, RawDisplayHandle::Windows(_))
        }

        unsafe fn create_surface(
            &self,
            entry: &Entry,
            instance: &Instance,
            _display: RawDisplayHandle,
            window: RawWindowHandle,
        ) -> BackendResult<vk::SurfaceKHR> {
            let RawWindowHandle::Win32(handle) = window else {
                return Err(BackendError::UnsupportedPlatform(format!("{:?}", window)));
            };

            let hinstance = handle.hinstance.map(|h| h.get()).unwrap_or(0) as *const std::ffi::c_void;
            let hwnd = handle.hwnd.get() as *const std::ffi::c_void;
            let create_info = vk::Win32SurfaceCreateInfoKHR::builder()
                .hinstance(hinstance)
                .hwnd(hwnd);

            khr::Win32Surface::new(entry, instance)
                .create_win32_surface(&create_info, None)
                .vk_context("vkCreateWin32SurfaceKHR")
        }
    }
}

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios", target_os = "android"))))]
mod unix {
    use super::*;

    pub struct XlibPlatform;

    impl SurfacePlatform for XlibPlatform {
        fn extension(&self) -> &'static CStr {
            khr::XlibSurface::name()
        }

        fn accepts(&self, display: RawDisplayHandle) -> bool {
            matches!(display, RawDisplayHandle::Xlib(_))
        }

        unsafe fn create_surface(
            &self,
            entry: &Entry,
            instance: &Instance,
            display: RawDisplayHandle,
            window: RawWindowHandle,
        ) -> BackendResult<vk::SurfaceKHR> {
            let (RawDisplayHandle::Xlib(display), RawWindowHandle::Xlib(window)) = (display, window) else {
                return Err(BackendError::UnsupportedPlatform(format!("{:?}", window)));
            };

            let dpy = display
                .display
                .map_or(std::ptr::null_mut(), |d| d.as_ptr());
            let create_info = vk::XlibSurfaceCreateInfoKHR::builder()
                .dpy(dpy as *mut vk::Display)
                .window(window.window as vk::Window);

            khr::XlibSurface::new(entry, instance)
                .create_xlib_surface(&create_info, None)
                .vk_context("vkCreateXlibSurfaceKHR")
        }
    }

    pub struct WaylandPlatform;

    impl SurfacePlatform for WaylandPlatform {
        fn extension(&self) -> &'static CStr {
            khr::WaylandSurface::name()
        }

        fn accepts(&self, display: RawDisplayHandle) -> bool {
            matches!(display, RawDisplayHandle::Wayland(_))
        }

        unsafe fn create_surface(
            &self,
            entry: &Entry,
            instance: &Instance,
            display: RawDisplayHandle,
            window: RawWindowHandle,
        ) -> BackendResult<vk::SurfaceKHR> {
            let (RawDisplayHandle::Wayland(display), RawWindowHandle::Wayland(window)) = (display, window) else {
                return Err(BackendError::UnsupportedPlatform(format!("{:?}", window)));
            };

            let create_info = vk::WaylandSurfaceCreateInfoKHR::builder()
                .display(display.display.as_ptr())
                .surface(window.surface.as_ptr());

            khr::WaylandSurface::new(entry, instance)
                .create_wayland_surface(&create_info, None)
                .vk_context("vkCreateWaylandSurfaceKHR")
        }
    }
}
