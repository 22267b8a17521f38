use std::sync::Arc;

use ash::vk;

use crate::dispatch::InstanceDispatch;

/// A GPU as handed to the application. Two instances over the same ICD see
/// the same driver values, so the application gets a loader-unique `handle`
/// and the driver's own value is only used when calling down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalDeviceEntry {
    pub handle: vk::PhysicalDevice,
    pub driver_handle: vk::PhysicalDevice,
}

/// One driver's presence inside one instance: the GPUs it exposes there and
/// its instance-level dispatch table.
pub struct Driver {
    icd_name: String,
    physical_devices: Vec<PhysicalDeviceEntry>,
    dispatch: Arc<dyn InstanceDispatch>,
}

impl Driver {
    pub fn new(
        icd_name: impl Into<String>,
        physical_devices: Vec<PhysicalDeviceEntry>,
        dispatch: Arc<dyn InstanceDispatch>,
    ) -> Self {
        Self {
            icd_name: icd_name.into(),
            physical_devices,
            dispatch,
        }
    }

    pub fn icd_name(&self) -> &str {
        &self.icd_name
    }

    /// Loader-side handles of this driver's GPUs, in driver order.
    pub fn physical_devices(&self) -> impl Iterator<Item = vk::PhysicalDevice> + '_ {
        self.physical_devices.iter().map(|e| e.handle)
    }

    /// The driver's own value for a loader-side GPU handle, if this driver
    /// exposes it.
    pub fn driver_handle(&self, physical_device: vk::PhysicalDevice) -> Option<vk::PhysicalDevice> {
        self.physical_devices
            .iter()
            .find(|e| e.handle == physical_device)
            .map(|e| e.driver_handle)
    }

    pub fn dispatch(&self) -> &Arc<dyn InstanceDispatch> {
        &self.dispatch
    }
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver")
            .field("icd_name", &self.icd_name)
            .field("physical_devices", &self.physical_devices)
            .finish_non_exhaustive()
    }
}
