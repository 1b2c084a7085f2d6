//! Configuration file for interceptor defaults.
//!
//! Resolution order:
//! 1. Explicit path passed to [`Config::load`]
//! 2. `~/.mimir/config.toml` (user)
//! 3. `/etc/mimir/config.toml` (system)
//!
//! ```toml
//! [defaults]
//! max_size = 500
//! expiration = 10
//! unit = "minutes"
//!
//! [owners."my_app::repo::UserRepo"]
//! expiration = 30
//! unit = "seconds"
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::{CacheDefaults, CacheSettings};
use crate::{MimirError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    /// Instance-level defaults.
    #[serde(default)]
    pub defaults: CacheDefaults,
    /// Settings per owner type, keyed by its full type name.
    #[serde(default)]
    pub owners: HashMap<String, CacheSettings>,
}

impl Config {
    /// Load configuration from file.
    ///
    /// # Errors
    ///
    /// Fails if no file is found, or the file is unreadable, malformed, or
    /// holds unusable defaults.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?.ok_or_else(|| {
            MimirError::InvalidConfiguration(
                "No config file found. Create ~/.mimir/config.toml or /etc/mimir/config.toml"
                    .to_string(),
            )
        })?;
        Self::load_from_file(&path)
    }

    /// Like [`load`](Self::load), but built-in defaults when no file exists.
    ///
    /// An explicit path must still exist.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            MimirError::InvalidConfiguration(format!("Failed to parse config: {e}"))
        })?;
        config.defaults.validate()?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            MimirError::InvalidConfiguration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml_str(&content)
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(MimirError::InvalidConfiguration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".mimir").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/mimir/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TimeUnit;

    #[test]
    fn empty_config_uses_hardcoded_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.defaults, CacheDefaults::default());
        assert!(config.owners.is_empty());
    }

    #[test]
    fn parse_partial_defaults() {
        let toml = r#"
            [defaults]
            expiration = 10
            unit = "minutes"
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.defaults.expiration, 10);
        assert_eq!(config.defaults.unit, TimeUnit::Minutes);
        // Defaults preserved
        assert_eq!(config.defaults.max_size, 1024);
    }

    #[test]
    fn parse_owner_settings() {
        let toml = r#"
            [owners."app::Repo"]
            max_size = 3
        "#;
        let config = Config::from_toml_str(toml).unwrap();
        let owner = config.owners.get("app::Repo").unwrap();
        assert_eq!(owner.max_size, Some(3));
        assert_eq!(owner.expiration, None);
    }

    #[test]
    fn zero_max_size_is_rejected() {
        let err = Config::from_toml_str("[defaults]\nmax_size = 0\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn unknown_unit_is_rejected() {
        let err = Config::from_toml_str("[defaults]\nunit = \"fortnights\"\n").unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let path = Path::new("/definitely/not/here/mimir.toml");
        assert!(Config::load(Some(path)).is_err());
        assert!(Config::load_or_default(Some(path)).is_err());
    }
}
