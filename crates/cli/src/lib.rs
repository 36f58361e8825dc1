//! AutoUnpack library surface shared by the binary and its tests

pub mod extract;
pub mod locks;
pub mod system_config;

pub use extract::{ArchiveExtractor, ExtractError};
pub use system_config::{Settings, SystemConfig};
