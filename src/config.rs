//! Configuration loaded from TOML.
//!
//! ```toml
//! database_path = "db.sqlite3"
//! session_limit = 20
//!
//! [sm2]
//! first_interval_days = 1
//! second_interval_days = 6
//! ```

use crate::error::ConfigError;
use crate::models::Sm2Params;
use crate::models::sm2::INTERVAL_LIMIT_DAYS;
use crate::models::study_session::DEFAULT_SESSION_LIMIT;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no path is given.
pub const LOCAL_CONFIG_FILE: &str = "flashcards.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_path: PathBuf,
    /// Maximum cards handed out by one study session.
    pub session_limit: usize,
    pub sm2: Sm2Params,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("db.sqlite3"),
            session_limit: DEFAULT_SESSION_LIMIT,
            sm2: Sm2Params::default(),
        }
    }
}

impl Config {
    /// Loads `path` if given (it must exist), otherwise the first config found in
    /// the working directory or the user config dir, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::from_file(path);
        }

        let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE))
            .chain(dirs::config_dir().map(|dir| dir.join("flashcards").join("config.toml")));

        for candidate in candidates {
            if candidate.is_file() {
                return Self::from_file(&candidate);
            }
        }

        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sm2 = &self.sm2;
        if self.session_limit == 0 {
            return Err(ConfigError::Invalid("session_limit must be at least 1".into()));
        }
        if !(sm2.min_easiness > 0.0) {
            return Err(ConfigError::Invalid("sm2.min_easiness must be positive".into()));
        }
        if sm2.initial_easiness < sm2.min_easiness {
            return Err(ConfigError::Invalid(format!(
                "sm2.initial_easiness ({}) is below sm2.min_easiness ({})",
                sm2.initial_easiness, sm2.min_easiness
            )));
        }
        if !(1..=5).contains(&sm2.pass_threshold) {
            return Err(ConfigError::Invalid(format!(
                "sm2.pass_threshold must be between 1 and 5, got {}",
                sm2.pass_threshold
            )));
        }
        if sm2.max_interval_days > INTERVAL_LIMIT_DAYS {
            return Err(ConfigError::Invalid(format!(
                "sm2.max_interval_days must be at most {}, got {}",
                INTERVAL_LIMIT_DAYS, sm2.max_interval_days
            )));
        }
        let bootstrap = [
            ("first_interval_days", sm2.first_interval_days),
            ("second_interval_days", sm2.second_interval_days),
            ("lapse_interval_days", sm2.lapse_interval_days),
        ];
        for (name, days) in bootstrap {
            if days > sm2.max_interval_days {
                return Err(ConfigError::Invalid(format!(
                    "sm2.{} ({}) exceeds sm2.max_interval_days ({})",
                    name, days, sm2.max_interval_days
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn test_config_deserialization() {
        let config = Config::from_toml_str(
            r#"
            database_path = "/tmp/cards.db"
            session_limit = 5

            [sm2]
            second_interval_days = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/cards.db"));
        assert_eq!(config.session_limit, 5);
        assert_eq!(config.sm2.second_interval_days, 4);
        assert_eq!(config.sm2.min_easiness, 1.3);
        assert_eq!(config.sm2.first_interval_days, 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for toml_str in [
            "session_limit = 0",
            "[sm2]\npass_threshold = 0",
            "[sm2]\npass_threshold = 6",
            "[sm2]\ninitial_easiness = 1.0",
            "[sm2]\nmin_easiness = 0.0\ninitial_easiness = 2.5",
            "[sm2]\nmax_interval_days = 4000000000",
            "[sm2]\nmax_interval_days = 36501",
            "[sm2]\nmax_interval_days = 5",
            "[sm2]\nlapse_interval_days = 40000",
        ] {
            assert!(
                matches!(Config::from_toml_str(toml_str), Err(ConfigError::Invalid(_))),
                "accepted: {toml_str}"
            );
        }
    }

    #[test]
    fn test_accepts_shorter_interval_limit() {
        let config = Config::from_toml_str("[sm2]\nmax_interval_days = 365").unwrap();
        assert_eq!(config.sm2.max_interval_days, 365);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Config::from_toml_str("session_limit = \"many\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flashcards.toml");
        std::fs::write(&path, "session_limit = 3").unwrap();

        assert_eq!(Config::load(Some(&path)).unwrap().session_limit, 3);
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
