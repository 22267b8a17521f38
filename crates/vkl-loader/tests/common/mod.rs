//! Mock drivers shared by the loader integration tests.
//!
//! Every handle a mock driver hands out is `handle_base + n`, so the driver
//! that produced a handle (or answered a call) can be read back from the raw
//! value. Persistent-image queries answer with the driver's `handle_base` as
//! the image, which lets tests see which driver a call was routed to.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use ash::prelude::VkResult;
use ash::vk;
use ash::vk::Handle;

use vkl_loader::types::{
    DeviceCreateInfo, DisplayFormatProperties, DisplayInfo, DisplayInfoType, DisplayWsi,
    InstanceCreateInfo, PresentInfo, SwapChainCreateInfo, SwapChainImageProperties,
    SwapChainInfo, SwapChainInfoType, SwapChainWsi,
};
use vkl_loader::{
    Command, DeviceDispatch, ExtensionOrigin, ExtensionProperties, Icd, InstanceDispatch, Loader,
};

#[derive(Default)]
pub struct Counters {
    pub display_calls: AtomicUsize,
    pub instances_destroyed: AtomicUsize,
    pub devices_destroyed: AtomicUsize,
    pub swap_chains_created: AtomicUsize,
    pub swap_chains_destroyed: AtomicUsize,
    pub presents: AtomicUsize,
    next_handle: AtomicU64,
}

#[derive(Clone)]
pub struct MockIcd {
    pub name: String,
    pub handle_base: u64,
    pub gpu_count: u64,
    /// `None` leaves the display-query slot unset.
    pub display: Option<Result<vk::Format, vk::Result>>,
    pub swap_chain: bool,
    pub swap_chain_error: Option<vk::Result>,
    /// Raw value every new swap chain gets instead of a fresh one.
    pub fixed_swap_chain: Option<u64>,
    pub destroy_swap_chain_error: Option<vk::Result>,
    pub create_instance_error: Option<vk::Result>,
    pub instance_extensions: Vec<String>,
    pub device_extensions: Vec<String>,
    pub counters: Arc<Counters>,
}

impl MockIcd {
    pub fn new(name: &str, handle_base: u64) -> Self {
        Self {
            name: name.to_string(),
            handle_base,
            gpu_count: 1,
            display: None,
            swap_chain: false,
            swap_chain_error: None,
            fixed_swap_chain: None,
            destroy_swap_chain_error: None,
            create_instance_error: None,
            instance_extensions: Vec::new(),
            device_extensions: Vec::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn with_gpus(mut self, count: u64) -> Self {
        self.gpu_count = count;
        self
    }

    pub fn with_display(mut self, result: Result<vk::Format, vk::Result>) -> Self {
        self.display = Some(result);
        self
    }

    pub fn with_swap_chain(mut self) -> Self {
        self.swap_chain = true;
        self
    }

    pub fn with_swap_chain_error(mut self, code: vk::Result) -> Self {
        self.swap_chain = true;
        self.swap_chain_error = Some(code);
        self
    }

    pub fn with_fixed_swap_chain(mut self, raw: u64) -> Self {
        self.swap_chain = true;
        self.fixed_swap_chain = Some(raw);
        self
    }

    pub fn failing_swap_chain_destroy(mut self, code: vk::Result) -> Self {
        self.destroy_swap_chain_error = Some(code);
        self
    }

    pub fn failing_instance(mut self, code: vk::Result) -> Self {
        self.create_instance_error = Some(code);
        self
    }

    pub fn with_instance_extension(mut self, name: &str) -> Self {
        self.instance_extensions.push(name.to_string());
        self
    }

    pub fn with_device_extension(mut self, name: &str) -> Self {
        self.device_extensions.push(name.to_string());
        self
    }

    /// The driver's own value for its `index`th GPU. Applications never see
    /// it; the loader hands out its own handles instead.
    pub fn driver_gpu(&self, index: u64) -> vk::PhysicalDevice {
        vk::PhysicalDevice::from_raw(self.handle_base + 0x8000 + index)
    }

    pub fn into_arc(self) -> Arc<dyn Icd> {
        Arc::new(self)
    }

    fn assert_own_gpu(&self, physical_device: vk::PhysicalDevice) {
        assert!(
            (0..self.gpu_count).any(|i| self.driver_gpu(i) == physical_device),
            "{} called with foreign GPU {:#x}",
            self.name,
            physical_device.as_raw()
        );
    }

    fn next_handle(&self) -> u64 {
        self.handle_base + 1 + self.counters.next_handle.fetch_add(1, Ordering::Relaxed)
    }

    /// True when `raw` was produced by this driver.
    pub fn produced(&self, raw: u64) -> bool {
        raw > self.handle_base && raw < self.handle_base + 0x10_0000
    }
}

fn icd_extension(name: &str) -> ExtensionProperties {
    ExtensionProperties::new(name, 1, "mock driver extension", ExtensionOrigin::Icd)
}

impl Icd for MockIcd {
    fn name(&self) -> &str {
        &self.name
    }

    fn instance_extension_properties(&self) -> Vec<ExtensionProperties> {
        self.instance_extensions
            .iter()
            .map(|n| icd_extension(n))
            .collect()
    }

    fn create_instance(&self, _info: &InstanceCreateInfo) -> VkResult<Arc<dyn InstanceDispatch>> {
        if let Some(code) = self.create_instance_error {
            return Err(code);
        }
        Ok(Arc::new(MockInstance { icd: self.clone() }))
    }
}

pub struct MockInstance {
    icd: MockIcd,
}

impl InstanceDispatch for MockInstance {
    fn implements(&self, command: Command) -> bool {
        command == Command::GetDisplayInfoWsi && self.icd.display.is_some()
    }

    fn enumerate_physical_devices(&self) -> VkResult<Vec<vk::PhysicalDevice>> {
        Ok((0..self.icd.gpu_count).map(|i| self.icd.driver_gpu(i)).collect())
    }

    fn device_extension_properties(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> Vec<ExtensionProperties> {
        self.icd.assert_own_gpu(physical_device);
        self.icd
            .device_extensions
            .iter()
            .map(|n| icd_extension(n))
            .collect()
    }

    fn create_device(
        &self,
        physical_device: vk::PhysicalDevice,
        _info: &DeviceCreateInfo,
    ) -> VkResult<(vk::Device, Arc<dyn DeviceDispatch>)> {
        self.icd.assert_own_gpu(physical_device);
        let device = vk::Device::from_raw(self.icd.next_handle());
        Ok((device, Arc::new(MockDevice { icd: self.icd.clone() })))
    }

    fn get_display_info_wsi(
        &self,
        _display: DisplayWsi,
        _info_type: DisplayInfoType,
    ) -> VkResult<DisplayInfo> {
        self.icd.counters.display_calls.fetch_add(1, Ordering::SeqCst);
        match self.icd.display {
            Some(Ok(format)) => Ok(DisplayInfo::FormatProperties(vec![
                DisplayFormatProperties {
                    swap_chain_format: format,
                },
            ])),
            Some(Err(code)) => Err(code),
            None => panic!("loader called an unset display slot on {}", self.icd.name),
        }
    }

    fn destroy_instance(&self) {
        self.icd
            .counters
            .instances_destroyed
            .fetch_add(1, Ordering::SeqCst);
    }
}

pub struct MockDevice {
    icd: MockIcd,
}

impl DeviceDispatch for MockDevice {
    fn implements(&self, command: Command) -> bool {
        self.icd.swap_chain && command != Command::GetDisplayInfoWsi
    }

    fn get_device_queue(
        &self,
        device: vk::Device,
        queue_family_index: u32,
        queue_index: u32,
    ) -> vk::Queue {
        // Stable per (device, family, index), like a real driver.
        let offset = 0x4000 + u64::from(queue_family_index) * 0x10 + u64::from(queue_index);
        vk::Queue::from_raw(device.as_raw() + offset)
    }

    fn destroy_device(&self, _device: vk::Device) {
        self.icd
            .counters
            .devices_destroyed
            .fetch_add(1, Ordering::SeqCst);
    }

    fn create_swap_chain_wsi(
        &self,
        _device: vk::Device,
        _info: &SwapChainCreateInfo,
    ) -> VkResult<SwapChainWsi> {
        assert!(self.icd.swap_chain, "unset swap chain slot called");
        if let Some(code) = self.icd.swap_chain_error {
            return Err(code);
        }
        self.icd
            .counters
            .swap_chains_created
            .fetch_add(1, Ordering::SeqCst);
        let raw = self
            .icd
            .fixed_swap_chain
            .unwrap_or_else(|| self.icd.next_handle());
        Ok(SwapChainWsi::from_raw(raw))
    }

    fn destroy_swap_chain_wsi(&self, _swap_chain: SwapChainWsi) -> VkResult<()> {
        self.icd
            .counters
            .swap_chains_destroyed
            .fetch_add(1, Ordering::SeqCst);
        match self.icd.destroy_swap_chain_error {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn get_swap_chain_info_wsi(
        &self,
        _swap_chain: SwapChainWsi,
        _info_type: SwapChainInfoType,
    ) -> VkResult<SwapChainInfo> {
        Ok(SwapChainInfo::PersistentImages(vec![SwapChainImageProperties {
            image: vk::Image::from_raw(self.icd.handle_base),
            memory: vk::DeviceMemory::null(),
        }]))
    }

    fn queue_present_wsi(&self, _queue: vk::Queue, _info: &PresentInfo) -> VkResult<()> {
        self.icd.counters.presents.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Loader-side GPU handles of `instance`, in driver order.
pub fn gpus(loader: &Loader, instance: vk::Instance) -> Vec<vk::PhysicalDevice> {
    loader.enumerate_physical_devices(instance).unwrap()
}

/// Image handle a driver answers persistent-image queries with.
pub fn answering_driver(info: &SwapChainInfo) -> u64 {
    match info {
        SwapChainInfo::PersistentImages(images) => images[0].image.as_raw(),
    }
}

pub fn display_format(info: &DisplayInfo) -> vk::Format {
    match info {
        DisplayInfo::FormatProperties(props) => props[0].swap_chain_format,
    }
}

pub fn wsi_instance_info() -> InstanceCreateInfo {
    InstanceCreateInfo {
        application_name: Some("vkl-test".to_string()),
        api_version: vk::make_api_version(0, 1, 0, 0),
        enabled_extensions: vec![vkl_loader::wsi::EXTENSION_NAME.to_string()],
    }
}

pub fn plain_instance_info() -> InstanceCreateInfo {
    InstanceCreateInfo {
        application_name: Some("vkl-test".to_string()),
        api_version: vk::make_api_version(0, 1, 0, 0),
        enabled_extensions: Vec::new(),
    }
}

pub fn swap_chain_info() -> SwapChainCreateInfo {
    SwapChainCreateInfo {
        displays: vec![DisplayWsi::null()],
        image_count: 2,
        image_format: vk::Format::B8G8R8A8_UNORM,
        image_extent: vk::Extent2D {
            width: 640,
            height: 480,
        },
        image_array_size: 1,
        image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
        swap_modes: vkl_loader::types::SwapModeFlags::FLIP,
    }
}
