use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{BacktestSettings, CliOverrides, Config, DataSettings};

/// Prefix of environment variables that override file values,
/// e.g. `MARKETSIM__BACKTEST__INITIAL_INVESTMENT=5000`.
pub const ENV_PREFIX: &str = "MARKETSIM";

/// Loads the application configuration from a TOML file.
///
/// This function is the primary entry point for this crate. It reads the configuration file,
/// layers `MARKETSIM__*` environment variables on top, deserializes the result into our
/// strongly-typed `Config` struct and validates it.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let mut config = builder.try_deserialize::<Config>()?;
    config.normalize();
    config.validate()?;

    tracing::debug!(?config, "Loaded configuration.");
    Ok(config)
}
