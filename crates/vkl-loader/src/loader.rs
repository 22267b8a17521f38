use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use ash::vk;
use ash::vk::Handle;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, warn};

use vkl_core::{HandleRegistry, LoaderConfig};

use crate::dispatch::{DeviceTable, Icd};
use crate::driver::Driver;
use crate::extensions::ExtensionList;
use crate::instance::Instance;
use crate::wsi;

/// Everything the loader lock protects.
#[derive(Default)]
pub(crate) struct LoaderState {
    pub(crate) icds: Vec<Arc<dyn Icd>>,
    pub(crate) instances: Vec<Arc<Instance>>,
}

impl LoaderState {
    pub(crate) fn instance(&self, handle: vk::Instance) -> Option<&Arc<Instance>> {
        self.instances.iter().find(|i| i.handle() == handle)
    }

    /// Find the instance and driver behind a loader-side GPU handle, along
    /// with the driver's own value for it.
    pub(crate) fn find_physical_device(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Option<(&Arc<Instance>, &Driver, vk::PhysicalDevice)> {
        self.instances.iter().find_map(|instance| {
            instance.drivers().iter().find_map(|d| {
                d.driver_handle(physical_device)
                    .map(|driver_gpu| (instance, d, driver_gpu))
            })
        })
    }
}

/// Loader-wide state: registered drivers, live instances and the handle
/// registry.
///
/// Anything that mutates the instance list or walks the
/// instance/driver/GPU tree holds the loader lock. Calls confined to a single
/// device-level handle only touch the registry, which is internally sharded.
pub struct Loader {
    config: LoaderConfig,
    state: Mutex<LoaderState>,
    handles: HandleRegistry<Arc<DeviceTable>>,
    next_handle: AtomicU64,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            state: Mutex::new(LoaderState::default()),
            handles: HandleRegistry::new(),
            next_handle: AtomicU64::new(0x2000),
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Make a loaded driver available to instances created from now on.
    pub fn add_icd(&self, icd: Arc<dyn Icd>) {
        debug!("adding ICD {}", icd.name());
        self.lock().icds.push(icd);
    }

    pub fn instance_count(&self) -> usize {
        self.lock().instances.len()
    }

    /// Registry of every live device-level handle.
    pub fn handles(&self) -> &HandleRegistry<Arc<DeviceTable>> {
        &self.handles
    }

    /// Extensions an application may enable on a new instance: the loader's
    /// own plus everything the registered ICDs advertise, minus what the
    /// configuration disables.
    pub fn enumerate_instance_extension_properties(&self) -> Vec<crate::ExtensionProperties> {
        let state = self.lock();
        self.supported_instance_extensions(&state).into_vec()
    }

    pub(crate) fn supported_instance_extensions(&self, state: &LoaderState) -> ExtensionList {
        let mut list = ExtensionList::new();
        wsi::add_instance_extensions(&mut list);
        for icd in &state.icds {
            list.extend(icd.instance_extension_properties());
        }
        list.apply_config(&self.config.extensions);
        list
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, LoaderState> {
        self.state.lock()
    }

    /// Next loader-owned handle value. Instances and physical devices draw
    /// from the same counter, so no two of them ever share a value.
    pub(crate) fn alloc_handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

impl Drop for Loader {
    fn drop(&mut self) {
        let instances = std::mem::take(&mut self.state.get_mut().instances);
        for instance in instances {
            warn!(
                "instance {:#x} still alive at loader teardown",
                instance.handle().as_raw()
            );
            instance.teardown();
        }
        if !self.handles.is_empty() {
            warn!(
                "{} device-level handle(s) still registered at loader teardown",
                self.handles.len()
            );
        }
    }
}
