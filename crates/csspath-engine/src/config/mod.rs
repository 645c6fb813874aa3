pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader};
pub use schema::{CsspathConfig, OutputConfig, check_prefix};
