//! Parameter and result types of the entry points routed by the loader.

use ash::vk;

macro_rules! wsi_handle {
    ($name:ident, $object_type:expr) => {
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        pub struct $name(u64);

        impl $name {
            pub const fn null() -> Self {
                Self(0)
            }
        }

        impl vk::Handle for $name {
            const TYPE: vk::ObjectType = $object_type;

            fn as_raw(self) -> u64 {
                self.0
            }

            fn from_raw(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

wsi_handle!(DisplayWsi, vk::ObjectType::DISPLAY_KHR);
wsi_handle!(SwapChainWsi, vk::ObjectType::SWAPCHAIN_KHR);

bitflags::bitflags! {
    /// Presentation modes a swap chain may use.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct SwapModeFlags: u32 {
        const FLIP = 0x1;
        const BLIT = 0x2;
    }
}

#[derive(Debug, Clone, Default)]
pub struct InstanceCreateInfo {
    pub application_name: Option<String>,
    pub api_version: u32,
    pub enabled_extensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QueueCreateInfo {
    pub queue_family_index: u32,
    pub queue_count: u32,
}

#[derive(Debug, Clone, Default)]
pub struct DeviceCreateInfo {
    pub queue_create_infos: Vec<QueueCreateInfo>,
    pub enabled_extensions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayInfoType {
    FormatProperties,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFormatProperties {
    pub swap_chain_format: vk::Format,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayInfo {
    FormatProperties(Vec<DisplayFormatProperties>),
}

#[derive(Debug, Clone, Default)]
pub struct SwapChainCreateInfo {
    /// Displays the swap chain presents to
    pub displays: Vec<DisplayWsi>,
    pub image_count: u32,
    pub image_format: vk::Format,
    pub image_extent: vk::Extent2D,
    pub image_array_size: u32,
    pub image_usage: vk::ImageUsageFlags,
    pub swap_modes: SwapModeFlags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapChainInfoType {
    PersistentImages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapChainImageProperties {
    pub image: vk::Image,
    pub memory: vk::DeviceMemory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapChainInfo {
    PersistentImages(Vec<SwapChainImageProperties>),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PresentInfo {
    pub image: vk::Image,
    pub flip_interval: u32,
}
