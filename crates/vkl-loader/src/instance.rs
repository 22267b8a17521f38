//! Instance and device lifecycle.
//!
//! These entry points own the loader-side bookkeeping that makes routing
//! possible: instances join the live list, devices and queues are registered
//! against a [`DeviceTable`] shared with everything created from them.

use std::sync::Arc;

use ash::vk;
use ash::vk::Handle;
use tracing::{debug, info, warn};

use vkl_core::{CoreError, HandleKind, NULL_HANDLE};

use crate::dispatch::DeviceTable;
use crate::driver::{Driver, PhysicalDeviceEntry};
use crate::error::LoaderError;
use crate::extensions::{ExtensionList, ExtensionSet};
use crate::loader::Loader;
use crate::types::{DeviceCreateInfo, InstanceCreateInfo};

pub struct Instance {
    handle: vk::Instance,
    drivers: Vec<Driver>,
    enabled_extensions: ExtensionSet,
}

impl Instance {
    pub fn handle(&self) -> vk::Instance {
        self.handle
    }

    pub fn drivers(&self) -> &[Driver] {
        &self.drivers
    }

    pub fn enabled_extensions(&self) -> &ExtensionSet {
        &self.enabled_extensions
    }

    pub fn is_extension_enabled(&self, name: &str) -> bool {
        self.enabled_extensions.contains(name)
    }

    /// Physical devices of every driver, in driver order.
    pub fn physical_devices(&self) -> Vec<vk::PhysicalDevice> {
        self.drivers
            .iter()
            .flat_map(|d| d.physical_devices())
            .collect()
    }

    pub(crate) fn teardown(&self) {
        for driver in &self.drivers {
            debug!(
                "destroying {} instance of {:#x}",
                driver.icd_name(),
                self.handle.as_raw()
            );
            driver.dispatch().destroy_instance();
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instance")
            .field("handle", &self.handle)
            .field("drivers", &self.drivers)
            .field("enabled_extensions", &self.enabled_extensions)
            .finish()
    }
}

impl Loader {
    /// Create an instance across every registered ICD.
    ///
    /// ICDs that fail are skipped. If none succeeds the last driver error is
    /// returned, or [`LoaderError::IncompatibleDriver`] when there is no ICD
    /// at all.
    pub fn create_instance(&self, info: &InstanceCreateInfo) -> Result<vk::Instance, LoaderError> {
        let mut state = self.lock();

        let supported = self.supported_instance_extensions(&state);
        let (enabled_extensions, dropped) =
            ExtensionSet::negotiate(&info.enabled_extensions, &supported);
        for name in &dropped {
            warn!("instance extension {} requested but not supported", name);
        }

        let mut drivers = Vec::new();
        let mut last_error = None;
        for icd in &state.icds {
            let dispatch = match icd.create_instance(info) {
                Ok(d) => d,
                Err(code) => {
                    warn!("ICD {} failed to create instance: {:?}", icd.name(), code);
                    last_error = Some(code);
                    continue;
                }
            };
            match dispatch.enumerate_physical_devices() {
                Ok(gpus) => {
                    let gpus = gpus
                        .into_iter()
                        .map(|driver_handle| PhysicalDeviceEntry {
                            handle: vk::PhysicalDevice::from_raw(self.alloc_handle()),
                            driver_handle,
                        })
                        .collect();
                    drivers.push(Driver::new(icd.name(), gpus, dispatch));
                }
                Err(code) => {
                    warn!("ICD {} failed to enumerate GPUs: {:?}", icd.name(), code);
                    dispatch.destroy_instance();
                    last_error = Some(code);
                }
            }
        }

        if drivers.is_empty() {
            return Err(match last_error {
                Some(code) => LoaderError::Driver(code),
                None => LoaderError::IncompatibleDriver,
            });
        }

        let handle = vk::Instance::from_raw(self.alloc_handle());
        let instance = Arc::new(Instance {
            handle,
            drivers,
            enabled_extensions,
        });
        info!(
            "created instance {:#x}: {} driver(s), {} GPU(s), extensions {:?}",
            handle.as_raw(),
            instance.drivers.len(),
            instance.physical_devices().len(),
            instance.enabled_extensions.iter().collect::<Vec<_>>()
        );
        state.instances.push(instance);
        Ok(handle)
    }

    /// Destroy an instance, its drivers, and any device-level handle the
    /// application leaked under it. A null instance is a no-op.
    pub fn destroy_instance(&self, instance: vk::Instance) -> Result<(), LoaderError> {
        if instance.as_raw() == NULL_HANDLE {
            return Ok(());
        }

        let removed = {
            let mut state = self.lock();
            let pos = state
                .instances
                .iter()
                .position(|i| i.handle() == instance)
                .ok_or(LoaderError::UnknownInstance(instance.as_raw()))?;
            state.instances.remove(pos)
        };

        let mut leaked_devices = Vec::new();
        let leaked = self.handles().release_matching(|kind, table| {
            let owned = table.instance() == instance;
            if owned && kind == HandleKind::Device {
                leaked_devices.push(Arc::clone(table));
            }
            owned
        });
        if leaked > 0 {
            warn!(
                "instance {:#x} destroyed with {} device-level handle(s) still alive",
                instance.as_raw(),
                leaked
            );
        }
        for table in leaked_devices {
            debug!("destroying leaked device {:#x}", table.device().as_raw());
            table.dispatch().destroy_device(table.device());
        }

        removed.teardown();
        info!("destroyed instance {:#x}", instance.as_raw());
        Ok(())
    }

    pub fn enumerate_physical_devices(
        &self,
        instance: vk::Instance,
    ) -> Result<Vec<vk::PhysicalDevice>, LoaderError> {
        let state = self.lock();
        state
            .instance(instance)
            .map(|i| i.physical_devices())
            .ok_or(LoaderError::UnknownInstance(instance.as_raw()))
    }

    /// Create a logical device on the driver that owns `physical_device` and
    /// register it against a fresh device table.
    pub fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        info: &DeviceCreateInfo,
    ) -> Result<vk::Device, LoaderError> {
        let (instance, instance_extensions, dispatch, driver_gpu) = {
            let state = self.lock();
            let (instance, driver, driver_gpu) = state
                .find_physical_device(physical_device)
                .ok_or(LoaderError::UnknownPhysicalDevice(physical_device.as_raw()))?;
            debug!(
                "GPU {:#x} belongs to {} of instance {:#x} (driver GPU {:#x})",
                physical_device.as_raw(),
                driver.icd_name(),
                instance.handle().as_raw(),
                driver_gpu.as_raw()
            );
            (
                instance.handle(),
                instance.enabled_extensions().clone(),
                Arc::clone(driver.dispatch()),
                driver_gpu,
            )
        };

        let mut supported: ExtensionList = dispatch
            .device_extension_properties(driver_gpu)
            .into_iter()
            .collect();
        supported.apply_config(&self.config().extensions);
        let (device_extensions, dropped) =
            ExtensionSet::negotiate(&info.enabled_extensions, &supported);
        for name in &dropped {
            warn!("device extension {} requested but not supported", name);
        }

        let (device, device_dispatch) = dispatch
            .create_device(driver_gpu, info)
            .map_err(LoaderError::Driver)?;

        let table = Arc::new(DeviceTable::new(
            device,
            instance,
            device_dispatch,
            instance_extensions,
            device_extensions,
        ));
        if let Err(e) = self
            .handles()
            .register(device.as_raw(), HandleKind::Device, Arc::clone(&table))
        {
            table.dispatch().destroy_device(device);
            return Err(e.into());
        }

        info!(
            "created device {:#x} on GPU {:#x}",
            device.as_raw(),
            physical_device.as_raw()
        );
        Ok(device)
    }

    /// Destroy a device together with every queue and swap chain still
    /// registered under it.
    pub fn destroy_device(&self, device: vk::Device) -> Result<(), LoaderError> {
        if device.as_raw() == NULL_HANDLE {
            return Ok(());
        }

        let table = self
            .handles()
            .lookup_kind(device.as_raw(), HandleKind::Device)?;

        table.dispatch().destroy_device(device);

        let mut leaked_swap_chains = 0;
        let released = self.handles().release_matching(|kind, t| {
            let owned = Arc::ptr_eq(t, &table);
            if owned && kind == HandleKind::SwapChain {
                leaked_swap_chains += 1;
            }
            owned
        });
        if leaked_swap_chains > 0 {
            warn!(
                "device {:#x} destroyed with {} swap chain(s) still alive",
                device.as_raw(),
                leaked_swap_chains
            );
        }
        debug!(
            "destroyed device {:#x}, released {} handle(s)",
            device.as_raw(),
            released
        );
        Ok(())
    }

    /// Fetch a queue and route it to the device's table. Repeated calls for
    /// the same queue return the same handle and keep a single association.
    pub fn get_device_queue(
        &self,
        device: vk::Device,
        queue_family_index: u32,
        queue_index: u32,
    ) -> Result<vk::Queue, LoaderError> {
        let table = self
            .handles()
            .lookup_kind(device.as_raw(), HandleKind::Device)?;
        let queue = table
            .dispatch()
            .get_device_queue(device, queue_family_index, queue_index);
        let raw = queue.as_raw();
        let already_routed = || {
            self.handles().kind_of(raw) == Some(HandleKind::Queue)
                && self
                    .handles()
                    .get(raw)
                    .is_some_and(|t| Arc::ptr_eq(&t, &table))
        };

        if already_routed() {
            return Ok(queue);
        }

        match self.handles().register(raw, HandleKind::Queue, Arc::clone(&table)) {
            Ok(()) => Ok(queue),
            // Another thread fetched the same queue first.
            Err(CoreError::AlreadyRegistered { .. }) if already_routed() => Ok(queue),
            Err(e) => Err(e.into()),
        }
    }
}
