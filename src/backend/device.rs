// Vulkan Device - Core GPU interface
//
// Responsibilities:
// - Instance creation with surface extensions and optional validation
// - Physical device selection (first enumerated GPU)
// - Graphics queue family selection
// - Logical device + single queue creation
//
// Everything else in the backend borrows from this context object. Surfaces
// and swapchains hold an `Arc` to it so the device is only torn down after
// the last dependent is gone.

use ash::extensions::{ext, khr};
use ash::{vk, Entry};
use std::ffi::{CStr, CString};
use std::sync::Arc;

use super::error::{BackendResult, BackendError, VkResultExt};
use super::{platform, policy};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// Settings needed to bring the device up
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    pub app_name: String,
    pub enable_validation: bool,
    /// Log every instance and device layer after creation
    pub list_layers: bool,
}

struct SelectedDevice {
    physical_device: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    graphics_queue_family: u32,
    device: ash::Device,
    queue: vk::Queue,
}

/// Vulkan device wrapper with automatic cleanup
pub struct VulkanDevice {
    // Vulkan handles (destroyed in reverse order in Drop)
    device: ash::Device,
    physical_device: vk::PhysicalDevice,
    instance: ash::Instance,
    entry: Entry,

    // Queue handles
    queue: vk::Queue,
    graphics_queue_family: u32,

    // Debug utils (if validation enabled)
    debug_utils: Option<(ext::DebugUtils, vk::DebugUtilsMessengerEXT)>,

    properties: vk::PhysicalDeviceProperties,
    enabled_instance_extensions: Vec<&'static CStr>,
}

impl VulkanDevice {
    /// Create the instance, pick a GPU and open a logical device on it
    pub fn new(settings: &DeviceSettings) -> BackendResult<Arc<Self>> {
        log::info!("Creating Vulkan device: {}", settings.app_name);

        // Step 1: Load Vulkan library
        let entry = unsafe { Entry::load() }?;

        // Step 2: Create instance
        let enabled_instance_extensions = Self::instance_extensions(&entry, settings.enable_validation)?;
        let instance = Self::create_instance(
            &entry,
            &settings.app_name,
            &enabled_instance_extensions,
            settings.enable_validation,
        )?;

        // Step 3: Setup debug messenger if validation enabled
        let debug_utils = if settings.enable_validation {
            match Self::setup_debug_messenger(&entry, &instance) {
                Ok(messenger) => Some(messenger),
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            None
        };

        // Step 4: Pick GPU, queue family and open the logical device
        let selected = match Self::select_device(&instance, settings.list_layers.then_some(&entry)) {
            Ok(selected) => selected,
            Err(e) => {
                // Nothing depends on the instance yet; unwind it before bailing
                unsafe {
                    if let Some((debug_utils, messenger)) = &debug_utils {
                        debug_utils.destroy_debug_utils_messenger(*messenger, None);
                    }
                    instance.destroy_instance(None);
                }
                return Err(e);
            }
        };

        Ok(Arc::new(Self {
            device: selected.device,
            physical_device: selected.physical_device,
            instance,
            entry,
            queue: selected.queue,
            graphics_queue_family: selected.graphics_queue_family,
            debug_utils,
            properties: selected.properties,
            enabled_instance_extensions,
        }))
    }

    fn instance_extensions(entry: &Entry, enable_validation: bool) -> BackendResult<Vec<&'static CStr>> {
        let mut extensions = platform::surface_instance_extensions(entry)?;
        if enable_validation {
            extensions.push(ext::DebugUtils::name());
        }
        Ok(extensions)
    }

    fn create_instance(
        entry: &Entry,
        app_name: &str,
        extensions: &[&CStr],
        enable_validation: bool,
    ) -> BackendResult<ash::Instance> {
        let app_name_cstr = CString::new(app_name)?;

        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name_cstr)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_0);

        let extension_names: Vec<_> = extensions.iter().map(|name| name.as_ptr()).collect();

        // Validation layers
        let layer_names = if enable_validation {
            vec![VALIDATION_LAYER.as_ptr()]
        } else {
            vec![]
        };

        // Chained so instance creation and destruction are reported too
        let mut instance_debug_info = debug_messenger_create_info();

        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names);
        if enable_validation {
            create_info = create_info.push_next(&mut instance_debug_info);
        }

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .vk_context("vkCreateInstance")?;

        log::info!("Instance created with {} extension(s)", extensions.len());
        for name in extensions {
            log::debug!("  {}", name.to_string_lossy());
        }

        Ok(instance)
    }

    fn setup_debug_messenger(
        entry: &Entry,
        instance: &ash::Instance,
    ) -> BackendResult<(ext::DebugUtils, vk::DebugUtilsMessengerEXT)> {
        let debug_utils = ext::DebugUtils::new(entry, instance);

        let create_info = debug_messenger_create_info();

        let messenger = unsafe {
            debug_utils.create_debug_utils_messenger(&create_info, None)
        }
        .vk_context("vkCreateDebugUtilsMessengerEXT")?;

        Ok((debug_utils, messenger))
    }

    /// Device selection: first GPU, lowest graphics family, one queue at priority 1.0.
    ///
    /// Pass `entry` to also log the available instance and device layers.
    fn select_device(instance: &ash::Instance, list_layers: Option<&Entry>) -> BackendResult<SelectedDevice> {
        let physical_device = Self::pick_physical_device(instance)?;
        let properties = unsafe { instance.get_physical_device_properties(physical_device) };
        let queue_families = unsafe { instance.get_physical_device_queue_family_properties(physical_device) };
        let graphics_queue_family = policy::pick_graphics_queue_family(&queue_families)?;

        log::info!("Selected GPU: {}",
            unsafe { CStr::from_ptr(properties.device_name.as_ptr()) }
                .to_string_lossy());
        log::info!("API Version: {}.{}.{}",
            vk::api_version_major(properties.api_version),
            vk::api_version_minor(properties.api_version),
            vk::api_version_patch(properties.api_version));
        log::info!("Graphics queue family: {} of {}", graphics_queue_family, queue_families.len());

        if let Some(entry) = list_layers {
            Self::list_layers(entry, instance, physical_device);
        }

        let (device, queue) = Self::create_logical_device(instance, physical_device, graphics_queue_family)?;

        Ok(SelectedDevice {
            physical_device,
            properties,
            graphics_queue_family,
            device,
            queue,
        })
    }

    /// First GPU in enumeration order; no ranking
    fn pick_physical_device(instance: &ash::Instance) -> BackendResult<vk::PhysicalDevice> {
        let devices = unsafe { instance.enumerate_physical_devices() }
            .vk_context("vkEnumeratePhysicalDevices")?;

        log::debug!("Found {} physical device(s)", devices.len());

        devices.first().copied().ok_or(BackendError::NoPhysicalDevice)
    }

    fn list_layers(entry: &Entry, instance: &ash::Instance, physical_device: vk::PhysicalDevice) {
        #[allow(unused_unsafe)]
        let instance_layers = unsafe { entry.enumerate_instance_layer_properties() };
        match instance_layers {
            Ok(layers) => {
                log::info!("Instance layers: {} item(s)", layers.len());
                log_layers(&layers);
            }
            Err(e) => log::warn!("vkEnumerateInstanceLayerProperties failed: {:?}", e),
        }

        match unsafe { instance.enumerate_device_layer_properties(physical_device) } {
            Ok(layers) => {
                log::info!("Device layers: {} item(s)", layers.len());
                log_layers(&layers);
            }
            Err(e) => log::warn!("vkEnumerateDeviceLayerProperties failed: {:?}", e),
        }
    }

    fn create_logical_device(
        instance: &ash::Instance,
        physical_device: vk::PhysicalDevice,
        graphics_queue_family: u32,
    ) -> BackendResult<(ash::Device, vk::Queue)> {
        let queue_priorities = [1.0];
        let queue_create_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(graphics_queue_family)
            .queue_priorities(&queue_priorities)
            .build();

        let extensions = [khr::Swapchain::name().as_ptr()];

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(std::slice::from_ref(&queue_create_info))
            .enabled_extension_names(&extensions);

        let device = unsafe {
            instance.create_device(physical_device, &create_info, None)
        }
        .vk_context("vkCreateDevice")?;

        let queue = unsafe { device.get_device_queue(graphics_queue_family, 0) };

        Ok((device, queue))
    }

    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    pub fn queue(&self) -> vk::Queue {
        self.queue
    }

    pub fn graphics_queue_family(&self) -> u32 {
        self.graphics_queue_family
    }

    pub fn physical_device_properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    /// Instance extensions that were actually enabled (surface extensions included)
    pub fn enabled_instance_extensions(&self) -> &[&'static CStr] {
        &self.enabled_instance_extensions
    }

    /// Wait for device to be idle (e.g., before cleanup)
    pub fn wait_idle(&self) -> BackendResult<()> {
        unsafe { self.device.device_wait_idle() }.vk_context("vkDeviceWaitIdle")
    }
}

impl Drop for VulkanDevice {
    fn drop(&mut self) {
        log::info!("Destroying Vulkan device...");

        let _ = self.wait_idle();

        // Cleanup in reverse order
        unsafe {
            self.device.destroy_device(None);

            if let Some((debug_utils, messenger)) = self.debug_utils.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}

/// Messenger settings shared by the instance chain and the standalone messenger
fn debug_messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXT {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
        .build()
}

fn log_layers(layers: &[vk::LayerProperties]) {
    for layer in layers {
        let name = unsafe { CStr::from_ptr(layer.layer_name.as_ptr()) };
        let description = unsafe { CStr::from_ptr(layer.description.as_ptr()) };
        log::info!(" {:<40} | {}", name.to_string_lossy(), description.to_string_lossy());
    }
}

// Debug callback for validation layers
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    _message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _p_user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = CStr::from_ptr((*p_callback_data).p_message);

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            log::error!("[Vulkan] {}", message.to_string_lossy());
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            log::warn!("[Vulkan] {}", message.to_string_lossy());
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            log::debug!("[Vulkan] {}", message.to_string_lossy());
        }
        _ => {
            log::trace!("[Vulkan] {}", message.to_string_lossy());
        }
    }

    vk::FALSE
}
