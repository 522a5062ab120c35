pub mod common;
pub mod config;
pub mod context;
mod error;
pub mod git;
pub mod info;
pub mod response;

pub use config::{BootFlags, Config, ConfigError, Kind, Node};
pub use context::{AppContext, Entry};
pub use error::Error;
pub use response::{ErrorResponse, GrpcCode};
