use ash::vk;
use vkl_core::CoreError;

use crate::dispatch::Command;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("routing error: {0}")]
    Routing(#[from] CoreError),

    #[error("unknown instance: {0:#x}")]
    UnknownInstance(u64),

    #[error("physical device {0:#x} is not owned by any loaded driver")]
    UnknownPhysicalDevice(u64),

    #[error("driver returned {0:?}")]
    Driver(vk::Result),

    #[error("{} is not implemented by the owning driver", .0.name())]
    NotImplemented(Command),

    #[error("no driver handled the call")]
    InitializationFailed,

    #[error("no compatible driver available")]
    IncompatibleDriver,
}

impl LoaderError {
    /// The status an API-level caller sees. Driver results pass through
    /// unmodified.
    pub fn as_vk_result(&self) -> vk::Result {
        match self {
            LoaderError::Routing(CoreError::AlreadyRegistered { .. })
            | LoaderError::Routing(CoreError::NullHandle(_)) => {
                vk::Result::ERROR_INITIALIZATION_FAILED
            }
            LoaderError::Routing(_) => vk::Result::ERROR_DEVICE_LOST,
            LoaderError::UnknownInstance(_) | LoaderError::UnknownPhysicalDevice(_) => {
                vk::Result::ERROR_INITIALIZATION_FAILED
            }
            LoaderError::Driver(code) => *code,
            LoaderError::NotImplemented(_) => vk::Result::ERROR_EXTENSION_NOT_PRESENT,
            LoaderError::InitializationFailed => vk::Result::ERROR_INITIALIZATION_FAILED,
            LoaderError::IncompatibleDriver => vk::Result::ERROR_INCOMPATIBLE_DRIVER,
        }
    }
}

impl From<LoaderError> for vk::Result {
    fn from(err: LoaderError) -> Self {
        err.as_vk_result()
    }
}
