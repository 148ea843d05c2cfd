// src/registry/mod.rs
mod host;
mod hosts;

pub use host::Host;
pub use hosts::{HostRegistry, RegistryError};
