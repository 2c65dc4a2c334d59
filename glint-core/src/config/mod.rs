//! Configuration types and the device file loader

pub mod loader;
pub mod types;

pub use loader::{parse_config, ConfigError};
pub use types::*;
