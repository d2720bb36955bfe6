// Configuration management module
// Handles the TOML settings file, validation and credentials

pub mod interactive;
pub mod settings;

pub use interactive::{run_interactive_config, show_config};
pub use settings::{ApiKey, Config, ConfigError, ProviderConfig, ProviderKind};
