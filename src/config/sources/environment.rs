//! Environment variable source: AGENTRY prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// Uses AGENTRY prefix and __ as separator for nested keys, e.g. `AGENTRY__LLM__MODEL`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(environment_source()))
}

pub(crate) fn environment_source() -> Environment {
    Environment::with_prefix("AGENTRY")
        .separator("__")
        .try_parsing(true)
}
