//! Core registry functionality

pub mod locks;
pub mod registry;

pub use locks::ImportLocks;
pub use registry::RegistryService;
