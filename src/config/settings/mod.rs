
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use super::ruleset::RulesetLocator;

pub const PHPCS_PATH_ENV: &str = "MCP_PHPCS_PATH";
pub const PHPCBF_PATH_ENV: &str = "MCP_PHPCBF_PATH";
pub const RULESET_PATH_ENV: &str = "MCP_PHPCS_RULESET";

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_PHPCS_PATH: &str = "phpcs";
pub const DEFAULT_PHPCBF_PATH: &str = "phpcbf";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be determined")]
    DirectoryError,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Contents of `config.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    pub phpcs_path: Option<String>,
    pub phpcbf_path: Option<String>,
    pub ruleset_path: Option<String>,
}

impl ConfigFile {
    /// Read `config.json` from `config_dir`. A missing file yields the empty config.
    #[inline]
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let path = config_dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Settings taken from the process environment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub phpcs_path: Option<String>,
    pub phpcbf_path: Option<String>,
    pub ruleset_path: Option<String>,
}

impl EnvOverrides {
    #[inline]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build overrides from an arbitrary variable lookup; empty values count as unset
    #[inline]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            phpcs_path: non_empty(lookup(PHPCS_PATH_ENV)),
            phpcbf_path: non_empty(lookup(PHPCBF_PATH_ENV)),
            ruleset_path: non_empty(lookup(RULESET_PATH_ENV)),
        }
    }
}

/// Where the active ruleset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulesetSource {
    Environment,
    ConfigFile,
    Discovered,
}

impl fmt::Display for RulesetSource {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Environment => write!(f, "environment ({})", RULESET_PATH_ENV),
            Self::ConfigFile => write!(f, "config file"),
            Self::Discovered => write!(f, "discovered"),
        }
    }
}

/// Resolved configuration, read once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    phpcs_path: Option<String>,
    phpcbf_path: Option<String>,
    ruleset_path: Option<PathBuf>,
    ruleset_source: Option<RulesetSource>,
}

impl Config {
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".phpcs-mcp"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("phpcs-mcp"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    #[inline]
    pub fn config_file_path(config_dir: &Path) -> PathBuf {
        config_dir.join(CONFIG_FILE_NAME)
    }

    /// Load configuration from the environment, `config_dir/config.json` and,
    /// for the ruleset only, a search upward from `working_dir`.
    ///
    /// An unreadable or malformed config file is reported and skipped.
    #[inline]
    pub fn load(config_dir: &Path, working_dir: &Path) -> Self {
        let file = ConfigFile::load(config_dir).unwrap_or_else(|e| {
            warn!(
                "Ignoring config file {}: {}",
                Self::config_file_path(config_dir).display(),
                e
            );
            ConfigFile::default()
        });
        let locator = RulesetLocator::new(working_dir);

        Self::resolve(EnvOverrides::from_env(), file, || locator.locate())
    }

    /// Merge the sources; environment beats file, file beats discovery
    #[inline]
    pub fn resolve<F>(env: EnvOverrides, file: ConfigFile, locate: F) -> Self
    where
        F: FnOnce() -> Option<PathBuf>,
    {
        let phpcs_path = env.phpcs_path.or_else(|| non_empty(file.phpcs_path));
        let phpcbf_path = env.phpcbf_path.or_else(|| non_empty(file.phpcbf_path));

        let ruleset = env
            .ruleset_path
            .map(|path| (PathBuf::from(path), RulesetSource::Environment))
            .or_else(|| {
                non_empty(file.ruleset_path)
                    .map(|path| (PathBuf::from(path), RulesetSource::ConfigFile))
            })
            .or_else(|| locate().map(|path| (path, RulesetSource::Discovered)));

        let (ruleset_path, ruleset_source) = ruleset.unzip();

        Self {
            phpcs_path,
            phpcbf_path,
            ruleset_path,
            ruleset_source,
        }
    }

    /// Build a configuration from explicit values; an explicit ruleset counts as configured
    #[inline]
    pub fn new(
        phpcs_path: Option<String>,
        phpcbf_path: Option<String>,
        ruleset_path: Option<PathBuf>,
    ) -> Self {
        Self::resolve(
            EnvOverrides::default(),
            ConfigFile {
                phpcs_path,
                phpcbf_path,
                ruleset_path: ruleset_path.map(|p| p.to_string_lossy().into_owned()),
            },
            || None,
        )
    }

    #[inline]
    pub fn phpcs_path(&self) -> &str {
        self.phpcs_path.as_deref().unwrap_or(DEFAULT_PHPCS_PATH)
    }

    #[inline]
    pub fn phpcbf_path(&self) -> &str {
        self.phpcbf_path.as_deref().unwrap_or(DEFAULT_PHPCBF_PATH)
    }

    #[inline]
    pub fn ruleset_path(&self) -> Option<&Path> {
        self.ruleset_path.as_deref()
    }

    #[inline]
    pub fn ruleset_source(&self) -> Option<RulesetSource> {
        self.ruleset_source
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
