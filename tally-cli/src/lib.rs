//! Tally CLI support: configuration loading and logging setup.

pub mod config;
pub mod logging;

pub use config::{AuthConfig, CacheConfig, LogFormat, LoggingConfig, TallyConfig};
pub use logging::init_logging;
