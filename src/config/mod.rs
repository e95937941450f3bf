// Configuration management module
// Resolves the phpcs/phpcbf binaries and the coding-standard ruleset once at startup

pub mod ruleset;
pub mod settings;

pub use ruleset::{RULESET_CANDIDATES, RulesetLocator};
pub use settings::{Config, ConfigError, ConfigFile, EnvOverrides, RulesetSource};

/// Get the configuration directory path
#[inline]
pub fn get_config_dir() -> Result<std::path::PathBuf, ConfigError> {
    Config::config_dir()
}
