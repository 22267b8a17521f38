//! LunarG WSI extension: trampolines, the display-query terminator and
//! extension enablement.
//!
//! Every entry point here except the display query is owned by exactly one
//! driver and is routed through the handle registry. Displays are not tied to
//! a single GPU, so that query is answered by asking every driver.

use std::sync::Arc;

use ash::vk;
use ash::vk::Handle;
use tracing::{debug, trace, warn};

use vkl_core::HandleKind;

use crate::dispatch::Command;
use crate::error::LoaderError;
use crate::extensions::{ExtensionList, ExtensionOrigin, ExtensionProperties};
use crate::instance::Instance;
use crate::loader::Loader;
use crate::proc_address::ProcAddr;
use crate::types::{
    DisplayInfo, DisplayInfoType, DisplayWsi, PresentInfo, SwapChainCreateInfo, SwapChainInfo,
    SwapChainInfoType, SwapChainWsi,
};

pub const EXTENSION_NAME: &str = "VK_WSI_LunarG";
pub const REVISION: u32 = 3;

pub fn extension_properties() -> ExtensionProperties {
    ExtensionProperties::new(
        EXTENSION_NAME,
        REVISION,
        "loader: LunarG WSI extension",
        ExtensionOrigin::Loader,
    )
}

pub fn add_instance_extensions(list: &mut ExtensionList) {
    list.add(extension_properties());
}

/// The loader entry point implementing `command`.
pub(crate) fn proc_addr(command: Command) -> ProcAddr {
    match command {
        Command::GetDisplayInfoWsi => ProcAddr::GetDisplayInfoWsi(get_display_info_wsi),
        Command::CreateSwapChainWsi => ProcAddr::CreateSwapChainWsi(create_swap_chain_wsi),
        Command::DestroySwapChainWsi => ProcAddr::DestroySwapChainWsi(destroy_swap_chain_wsi),
        Command::GetSwapChainInfoWsi => ProcAddr::GetSwapChainInfoWsi(get_swap_chain_info_wsi),
        Command::QueuePresentWsi => ProcAddr::QueuePresentWsi(queue_present_wsi),
    }
}

// ── Trampolines ─────────────────────────────────────────────

pub fn get_display_info_wsi(
    loader: &Loader,
    display: DisplayWsi,
    info_type: DisplayInfoType,
) -> Result<DisplayInfo, LoaderError> {
    let state = loader.lock();
    terminator_get_display_info(&state.instances, display, info_type)
}

/// Create a swap chain on the device's driver. The new handle is routed to
/// the device's own table before it is returned.
pub fn create_swap_chain_wsi(
    loader: &Loader,
    device: vk::Device,
    info: &SwapChainCreateInfo,
) -> Result<SwapChainWsi, LoaderError> {
    let table = loader
        .handles()
        .lookup_kind(device.as_raw(), HandleKind::Device)?;
    let swap_chain = table
        .slot(Command::CreateSwapChainWsi)?
        .create_swap_chain_wsi(device, info)
        .map_err(LoaderError::Driver)?;

    if let Err(e) = loader.handles().register(
        swap_chain.as_raw(),
        HandleKind::SwapChain,
        Arc::clone(&table),
    ) {
        // Unroutable; hand it straight back to the driver.
        if let Ok(dispatch) = table.slot(Command::DestroySwapChainWsi) {
            if let Err(code) = dispatch.destroy_swap_chain_wsi(swap_chain) {
                warn!(
                    "driver failed to destroy unroutable swap chain {:#x}: {:?}",
                    swap_chain.as_raw(),
                    code
                );
            }
        }
        return Err(e.into());
    }

    debug!(
        "created swap chain {:#x} on device {:#x}",
        swap_chain.as_raw(),
        device.as_raw()
    );
    Ok(swap_chain)
}

/// Destroy a swap chain. The association is dropped only once the driver
/// reports success.
pub fn destroy_swap_chain_wsi(
    loader: &Loader,
    swap_chain: SwapChainWsi,
) -> Result<(), LoaderError> {
    let table = loader
        .handles()
        .lookup_kind(swap_chain.as_raw(), HandleKind::SwapChain)?;
    table
        .slot(Command::DestroySwapChainWsi)?
        .destroy_swap_chain_wsi(swap_chain)
        .map_err(LoaderError::Driver)?;
    loader.handles().release(swap_chain.as_raw())?;
    debug!("destroyed swap chain {:#x}", swap_chain.as_raw());
    Ok(())
}

pub fn get_swap_chain_info_wsi(
    loader: &Loader,
    swap_chain: SwapChainWsi,
    info_type: SwapChainInfoType,
) -> Result<SwapChainInfo, LoaderError> {
    let table = loader
        .handles()
        .lookup_kind(swap_chain.as_raw(), HandleKind::SwapChain)?;
    table
        .slot(Command::GetSwapChainInfoWsi)?
        .get_swap_chain_info_wsi(swap_chain, info_type)
        .map_err(LoaderError::Driver)
}

pub fn queue_present_wsi(
    loader: &Loader,
    queue: vk::Queue,
    info: &PresentInfo,
) -> Result<(), LoaderError> {
    let table = loader
        .handles()
        .lookup_kind(queue.as_raw(), HandleKind::Queue)?;
    table
        .slot(Command::QueuePresentWsi)?
        .queue_present_wsi(queue, info)
        .map_err(LoaderError::Driver)
}

// ── Terminator ──────────────────────────────────────────────

/// Ask every GPU of every driver of every live instance about `display`.
///
/// The driver is called once per GPU it exposes and the last successful
/// answer wins; failures are skipped. With no successful answer the result is
/// [`LoaderError::InitializationFailed`].
pub fn terminator_get_display_info(
    instances: &[Arc<Instance>],
    display: DisplayWsi,
    info_type: DisplayInfoType,
) -> Result<DisplayInfo, LoaderError> {
    let display_raw = display.as_raw();
    let mut result = Err(LoaderError::InitializationFailed);

    for instance in instances {
        for driver in instance.drivers() {
            let dispatch = driver.dispatch();
            if !dispatch.implements(Command::GetDisplayInfoWsi) {
                trace!("{} has no display query, skipping", driver.icd_name());
                continue;
            }
            for gpu in driver.physical_devices() {
                match dispatch.get_display_info_wsi(display, info_type) {
                    Ok(info) => {
                        debug!(
                            "display {:#x} answered by {} (GPU {:#x})",
                            display_raw,
                            driver.icd_name(),
                            gpu.as_raw()
                        );
                        result = Ok(info);
                    }
                    Err(code) => debug!(
                        "display {:#x} query failed on {} (GPU {:#x}): {:?}",
                        display_raw,
                        driver.icd_name(),
                        gpu.as_raw(),
                        code
                    ),
                }
            }
        }
    }

    result
}

// ── Loader entry points ─────────────────────────────────────

impl Loader {
    pub fn get_display_info_wsi(
        &self,
        display: DisplayWsi,
        info_type: DisplayInfoType,
    ) -> Result<DisplayInfo, LoaderError> {
        get_display_info_wsi(self, display, info_type)
    }

    pub fn create_swap_chain_wsi(
        &self,
        device: vk::Device,
        info: &SwapChainCreateInfo,
    ) -> Result<SwapChainWsi, LoaderError> {
        create_swap_chain_wsi(self, device, info)
    }

    pub fn destroy_swap_chain_wsi(&self, swap_chain: SwapChainWsi) -> Result<(), LoaderError> {
        destroy_swap_chain_wsi(self, swap_chain)
    }

    pub fn get_swap_chain_info_wsi(
        &self,
        swap_chain: SwapChainWsi,
        info_type: SwapChainInfoType,
    ) -> Result<SwapChainInfo, LoaderError> {
        get_swap_chain_info_wsi(self, swap_chain, info_type)
    }

    pub fn queue_present_wsi(
        &self,
        queue: vk::Queue,
        info: &PresentInfo,
    ) -> Result<(), LoaderError> {
        queue_present_wsi(self, queue, info)
    }
}
