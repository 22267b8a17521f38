//! Dispatch routing core of the VKL Vulkan loader.
//!
//! Drivers are registered with a [`Loader`] as [`Icd`] trait objects. Every
//! handle a driver returns is bound to that driver's dispatch table for its
//! whole lifetime, so later calls on the handle (and on anything created from
//! it) reach the same driver. Calls that no single driver owns are fanned out
//! over every loaded driver, and entry points of optional extensions are only
//! handed out to instances and devices that enabled them.

pub mod dispatch;
pub mod driver;
pub mod error;
pub mod extensions;
pub mod instance;
pub mod loader;
pub mod proc_address;
pub mod types;
pub mod wsi;

pub use dispatch::{Command, CommandScope, DeviceDispatch, DeviceTable, Icd, InstanceDispatch};
pub use driver::{Driver, PhysicalDeviceEntry};
pub use error::LoaderError;
pub use extensions::{ExtensionList, ExtensionOrigin, ExtensionProperties, ExtensionSet};
pub use instance::Instance;
pub use loader::Loader;
pub use proc_address::ProcAddr;
