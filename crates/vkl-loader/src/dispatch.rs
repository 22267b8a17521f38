//! Dispatch tables.
//!
//! Each loaded driver hands the loader one [`InstanceDispatch`] per instance
//! and one [`DeviceDispatch`] per logical device. Both are immutable once
//! handed over and are shared by `Arc` among every handle created under them.
//! Optional slots are advertised through `implements`; the loader never calls
//! a slot whose driver does not implement it.

use std::sync::Arc;

use ash::prelude::VkResult;
use ash::vk;

use crate::error::LoaderError;
use crate::extensions::{ExtensionProperties, ExtensionSet};
use crate::types::{
    DeviceCreateInfo, DisplayInfo, DisplayInfoType, DisplayWsi, InstanceCreateInfo, PresentInfo,
    SwapChainCreateInfo, SwapChainInfo, SwapChainInfoType, SwapChainWsi,
};
use crate::wsi;

/// Operations routed through the loader's own entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    GetDisplayInfoWsi,
    CreateSwapChainWsi,
    DestroySwapChainWsi,
    GetSwapChainInfoWsi,
    QueuePresentWsi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    Instance,
    Device,
}

impl Command {
    pub const ALL: [Command; 5] = [
        Command::GetDisplayInfoWsi,
        Command::CreateSwapChainWsi,
        Command::DestroySwapChainWsi,
        Command::GetSwapChainInfoWsi,
        Command::QueuePresentWsi,
    ];

    /// The API-level entry point name.
    pub fn name(self) -> &'static str {
        match self {
            Command::GetDisplayInfoWsi => "vkGetDisplayInfoWSI",
            Command::CreateSwapChainWsi => "vkCreateSwapChainWSI",
            Command::DestroySwapChainWsi => "vkDestroySwapChainWSI",
            Command::GetSwapChainInfoWsi => "vkGetSwapChainInfoWSI",
            Command::QueuePresentWsi => "vkQueuePresentWSI",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    pub fn scope(self) -> CommandScope {
        match self {
            Command::GetDisplayInfoWsi => CommandScope::Instance,
            Command::CreateSwapChainWsi
            | Command::DestroySwapChainWsi
            | Command::GetSwapChainInfoWsi
            | Command::QueuePresentWsi => CommandScope::Device,
        }
    }

    /// Name of the extension that must be enabled for the command to resolve.
    pub fn extension(self) -> &'static str {
        wsi::EXTENSION_NAME
    }
}

/// A loaded driver, before any instance exists.
pub trait Icd: Send + Sync {
    fn name(&self) -> &str;

    /// Instance extensions the driver advertises.
    fn instance_extension_properties(&self) -> Vec<ExtensionProperties> {
        Vec::new()
    }

    fn create_instance(&self, info: &InstanceCreateInfo) -> VkResult<Arc<dyn InstanceDispatch>>;
}

/// Instance-level dispatch table of one driver.
pub trait InstanceDispatch: Send + Sync {
    fn implements(&self, command: Command) -> bool {
        let _ = command;
        false
    }

    fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>>;

    fn device_extension_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<ExtensionProperties> {
        let _ = physical_device;
        Vec::new()
    }

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        info: &DeviceCreateInfo,
    ) -> VkResult<(vk::Device, Arc<dyn DeviceDispatch>)>;

    fn get_display_info_wsi(
        &self,
        display: DisplayWsi,
        info_type: DisplayInfoType,
    ) -> VkResult<DisplayInfo> {
        let _ = (display, info_type);
        Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT)
    }

    /// Called once when the owning instance is destroyed.
    fn destroy_instance(&self) {}
}

/// Device-level dispatch table of one driver.
pub trait DeviceDispatch: Send + Sync {
    fn implements(&self, command: Command) -> bool {
        let _ = command;
        false
    }

    fn get_device_queue(
        &self,
        device: vk::Device,
        queue_family_index: u32,
        queue_index: u32,
    ) -> vk::Queue;

    fn destroy_device(&self, device: vk::Device);

    fn create_swap_chain_wsi(
        &self,
        device: vk::Device,
        info: &SwapChainCreateInfo,
    ) -> VkResult<SwapChainWsi> {
        let _ = (device, info);
        Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT)
    }

    fn destroy_swap_chain_wsi(&self, swap_chain: SwapChainWsi) -> VkResult<()> {
        let _ = swap_chain;
        Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT)
    }

    fn get_swap_chain_info_wsi(
        &self,
        swap_chain: SwapChainWsi,
        info_type: SwapChainInfoType,
    ) -> VkResult<SwapChainInfo> {
        let _ = (swap_chain, info_type);
        Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT)
    }

    fn queue_present_wsi(&self, queue: vk::Queue, info: &PresentInfo) -> VkResult<()> {
        let _ = (queue, info);
        Err(vk::Result::ERROR_EXTENSION_NOT_PRESENT)
    }
}

/// The table every device-level handle (device, its queues, its swap chains)
/// is registered against.
pub struct DeviceTable {
    device: vk::Device,
    instance: vk::Instance,
    dispatch: Arc<dyn DeviceDispatch>,
    instance_extensions: ExtensionSet,
    device_extensions: ExtensionSet,
}

impl DeviceTable {
    pub fn new(
        device: vk::Device,
        instance: vk::Instance,
        dispatch: Arc<dyn DeviceDispatch>,
        instance_extensions: ExtensionSet,
        device_extensions: ExtensionSet,
    ) -> Self {
        Self {
            device,
            instance,
            dispatch,
            instance_extensions,
            device_extensions,
        }
    }

    pub fn device(&self) -> vk::Device {
        self.device
    }

    pub fn instance(&self) -> vk::Instance {
        self.instance
    }

    pub fn dispatch(&self) -> &dyn DeviceDispatch {
        self.dispatch.as_ref()
    }

    pub fn device_extensions(&self) -> &ExtensionSet {
        &self.device_extensions
    }

    /// Whether `name` was negotiated for this device, either on the device
    /// itself or on the instance it was created from.
    pub fn is_extension_enabled(&self, name: &str) -> bool {
        self.device_extensions.contains(name) || self.instance_extensions.contains(name)
    }

    /// The dispatch table, if the driver fills the slot for `command`.
    pub(crate) fn slot(&self, command: Command) -> Result<&dyn DeviceDispatch, LoaderError> {
        if self.dispatch.implements(command) {
            Ok(self.dispatch.as_ref())
        } else {
            Err(LoaderError::NotImplemented(command))
        }
    }
}

impl std::fmt::Debug for DeviceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceTable")
            .field("device", &self.device)
            .field("instance", &self.instance)
            .field("instance_extensions", &self.instance_extensions)
            .field("device_extensions", &self.device_extensions)
            .finish_non_exhaustive()
    }
}
