//! Loader-independent building blocks: the handle registry that binds every
//! dispatchable handle to the dispatch table of the driver that created it,
//! handle kinds, configuration and core errors.

pub mod config;
pub mod error;
pub mod handle;
pub mod registry;

pub use config::LoaderConfig;
pub use error::CoreError;
pub use handle::{HandleKind, NULL_HANDLE};
pub use registry::HandleRegistry;
