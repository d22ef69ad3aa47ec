// Synchronization primitives and command pools
//
// Thin owners for the handful of objects the startup submissions need.
// Each one keeps the device alive and destroys its handle on drop.

use ash::vk;
use std::sync::Arc;

use super::error::{BackendResult, VkResultExt};
use super::VulkanDevice;

/// GPU -> CPU signal
pub struct Fence {
    fence: vk::Fence,
    device: Arc<VulkanDevice>,
}

impl Fence {
    pub fn new(device: &Arc<VulkanDevice>) -> BackendResult<Self> {
        let fence_info = vk::FenceCreateInfo::builder();
        let fence = unsafe { device.device().create_fence(&fence_info, None) }
            .vk_context("vkCreateFence")?;

        Ok(Self {
            fence,
            device: device.clone(),
        })
    }

    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Block until signalled; the timeout is unbounded
    pub fn wait(&self) -> BackendResult<()> {
        unsafe {
            self.device
                .device()
                .wait_for_fences(&[self.fence], true, u64::MAX)
        }
        .vk_context("vkWaitForFences")
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe { self.device.device().destroy_fence(self.fence, None) };
    }
}

/// GPU -> GPU signal between queue submissions
pub struct Semaphore {
    semaphore: vk::Semaphore,
    device: Arc<VulkanDevice>,
}

impl Semaphore {
    pub fn new(device: &Arc<VulkanDevice>) -> BackendResult<Self> {
        let semaphore_info = vk::SemaphoreCreateInfo::builder();
        let semaphore = unsafe { device.device().create_semaphore(&semaphore_info, None) }
            .vk_context("vkCreateSemaphore")?;

        Ok(Self {
            semaphore,
            device: device.clone(),
        })
    }

    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe { self.device.device().destroy_semaphore(self.semaphore, None) };
    }
}

/// Command pool on the graphics queue family. Destroying it frees every
/// buffer allocated from it.
pub struct CommandPool {
    pool: vk::CommandPool,
    device: Arc<VulkanDevice>,
}

impl CommandPool {
    pub fn new(device: &Arc<VulkanDevice>) -> BackendResult<Self> {
        let pool_info = vk::CommandPoolCreateInfo::builder()
            .queue_family_index(device.graphics_queue_family())
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

        let pool = unsafe { device.device().create_command_pool(&pool_info, None) }
            .vk_context("vkCreateCommandPool")?;

        Ok(Self {
            pool,
            device: device.clone(),
        })
    }

    pub fn allocate(&self, count: u32) -> BackendResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        unsafe { self.device.device().allocate_command_buffers(&alloc_info) }
            .vk_context("vkAllocateCommandBuffers")
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe { self.device.device().destroy_command_pool(self.pool, None) };
    }
}
