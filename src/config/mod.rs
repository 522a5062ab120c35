//! Configuration loading and management.

mod builder;
mod env;
mod error;
mod file;
mod flags;
mod node;
pub mod overlay;
pub mod overrides;
mod resolve;
mod source;

pub use builder::Config;
pub use env::EnvSource;
pub use error::ConfigError;
pub use file::{load_config_file, FileSource};
pub use flags::{BootFlags, BOOT_CONFIG_FLAG, OVERRIDES_FLAG};
pub use node::{Kind, Mapping, Node};
pub use overlay::{override_mapping, override_node, override_node_reporting, override_sequence};
pub use overrides::parse_overrides;
pub use source::{ConfigEntry, ConfigSource};
