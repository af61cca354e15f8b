//! Loading of [`SuggestionConfig`] from a TOML file.
//!
//! The file is optional. Without `--config` or `NETINV_CONFIG` every knob
//! keeps its default, and keys missing from a file fall back the same way.

use std::path::{Path, PathBuf};

use netinv_address_models::SuggestionConfig;

/// Environment variable naming the config file when `--config` is absent.
pub const CONFIG_ENV: &str = "NETINV_CONFIG";

/// Errors that can occur while loading the config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML for [`SuggestionConfig`].
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        /// Path that was parsed.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The values parse but cannot work together.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Resolves the config path from the CLI flag, then [`CONFIG_ENV`].
#[must_use]
pub fn resolve_path(flag: Option<PathBuf>) -> Option<PathBuf> {
    flag.or_else(|| {
        std::env::var_os(CONFIG_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}

/// Loads the config at `path`, or the defaults when `path` is `None`.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed, or if
/// the resulting values are inconsistent.
pub fn load(path: Option<&Path>) -> Result<SuggestionConfig, ConfigError> {
    let Some(path) = path else {
        log::debug!("No config file given, using defaults");
        return Ok(SuggestionConfig::default());
    };

    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = parse(&contents).map_err(|e| match e {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;

    log::info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Parses and checks config `contents`.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and
/// [`ConfigError::Invalid`] for inconsistent values.
pub fn parse(contents: &str) -> Result<SuggestionConfig, ConfigError> {
    let config: SuggestionConfig =
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &SuggestionConfig) -> Result<(), ConfigError> {
    if config.max_limit == 0 {
        return Err(ConfigError::Invalid {
            message: "max_limit must be at least 1".to_string(),
        });
    }
    if config.default_limit == 0 || config.default_limit > config.max_limit {
        return Err(ConfigError::Invalid {
            message: format!(
                "default_limit must be between 1 and max_limit ({}), got {}",
                config.max_limit, config.default_limit
            ),
        });
    }
    if config.dictionary_refresh_secs == Some(0) {
        return Err(ConfigError::Invalid {
            message: "dictionary_refresh_secs must be positive".to_string(),
        });
    }
    Ok(())
}
