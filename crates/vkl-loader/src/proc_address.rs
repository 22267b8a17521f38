//! Name → entry point resolution, gated by extension enablement.
//!
//! A name resolves only when it is one of the loader's own commands, a live
//! non-null handle was supplied, and the command's extension was enabled on
//! that handle. Anything else yields `None`, never an error.

use ash::vk;
use ash::vk::Handle;
use tracing::debug;

use vkl_core::{HandleKind, NULL_HANDLE};

use crate::dispatch::{Command, CommandScope};
use crate::error::LoaderError;
use crate::loader::Loader;
use crate::types::{
    DisplayInfo, DisplayInfoType, DisplayWsi, PresentInfo, SwapChainCreateInfo, SwapChainInfo,
    SwapChainInfoType, SwapChainWsi,
};
use crate::wsi;

pub type PfnGetDisplayInfoWsi =
    fn(&Loader, DisplayWsi, DisplayInfoType) -> Result<DisplayInfo, LoaderError>;
pub type PfnCreateSwapChainWsi =
    fn(&Loader, vk::Device, &SwapChainCreateInfo) -> Result<SwapChainWsi, LoaderError>;
pub type PfnDestroySwapChainWsi = fn(&Loader, SwapChainWsi) -> Result<(), LoaderError>;
pub type PfnGetSwapChainInfoWsi =
    fn(&Loader, SwapChainWsi, SwapChainInfoType) -> Result<SwapChainInfo, LoaderError>;
pub type PfnQueuePresentWsi = fn(&Loader, vk::Queue, &PresentInfo) -> Result<(), LoaderError>;

/// A resolved entry point. Every variant takes the loader explicitly so the
/// call routes through the same state it was resolved from.
#[derive(Clone, Copy)]
pub enum ProcAddr {
    GetDisplayInfoWsi(PfnGetDisplayInfoWsi),
    CreateSwapChainWsi(PfnCreateSwapChainWsi),
    DestroySwapChainWsi(PfnDestroySwapChainWsi),
    GetSwapChainInfoWsi(PfnGetSwapChainInfoWsi),
    QueuePresentWsi(PfnQueuePresentWsi),
}

impl ProcAddr {
    pub fn command(&self) -> Command {
        match self {
            ProcAddr::GetDisplayInfoWsi(_) => Command::GetDisplayInfoWsi,
            ProcAddr::CreateSwapChainWsi(_) => Command::CreateSwapChainWsi,
            ProcAddr::DestroySwapChainWsi(_) => Command::DestroySwapChainWsi,
            ProcAddr::GetSwapChainInfoWsi(_) => Command::GetSwapChainInfoWsi,
            ProcAddr::QueuePresentWsi(_) => Command::QueuePresentWsi,
        }
    }
}

impl std::fmt::Debug for ProcAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ProcAddr").field(&self.command().name()).finish()
    }
}

impl Loader {
    /// Resolve an instance-level entry point.
    pub fn get_instance_proc_addr(&self, instance: vk::Instance, name: &str) -> Option<ProcAddr> {
        if instance.as_raw() == NULL_HANDLE {
            return None;
        }
        let command = Command::from_name(name)?;

        let enabled = {
            let state = self.lock();
            match state.instance(instance) {
                Some(i) => i.is_extension_enabled(command.extension()),
                None => {
                    debug!(
                        "{} requested on unknown instance {:#x}",
                        name,
                        instance.as_raw()
                    );
                    return None;
                }
            }
        };
        if !enabled {
            debug!(
                "{} hidden: {} not enabled on instance {:#x}",
                name,
                command.extension(),
                instance.as_raw()
            );
            return None;
        }

        Some(wsi::proc_addr(command))
    }

    /// Resolve a device-level entry point. Instance-scoped commands never
    /// resolve here.
    pub fn get_device_proc_addr(&self, device: vk::Device, name: &str) -> Option<ProcAddr> {
        let raw = device.as_raw();
        if raw == NULL_HANDLE {
            return None;
        }
        let command = Command::from_name(name)?;
        if command.scope() != CommandScope::Device {
            return None;
        }

        if self.handles().kind_of(raw) != Some(HandleKind::Device) {
            debug!("{} requested on unknown device {:#x}", name, raw);
            return None;
        }
        let table = self.handles().get(raw)?;
        if !table.is_extension_enabled(command.extension()) {
            debug!(
                "{} hidden: {} not enabled on device {:#x}",
                name,
                command.extension(),
                raw
            );
            return None;
        }

        Some(wsi::proc_addr(command))
    }
}
