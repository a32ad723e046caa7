use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::error::AnalyticsError;
use crate::prelude::*;
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "config.json";

/// Persistent opt-out state of the analytics plugin.
///
/// Stored as `config.json` in the data directory handed over by the host. A missing file is
/// the default state, in which analytics are enabled.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalyticsConfig {
    #[serde(default)]
    pub is_analytics_disabled: bool,
}

fn get_configuration_file_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE_NAME)
}

impl AnalyticsConfig {
    /// Load the configuration. If it does not exist, return a default configuration.
    pub fn load(data_dir: &Path) -> Result<Self, AnalyticsError> {
        let config_path = get_configuration_file_path(data_dir);

        match fs::read(&config_path) {
            Ok(config_bytes) => {
                let config: AnalyticsConfig =
                    serde_json::from_slice(&config_bytes).map_err(|e| {
                        AnalyticsError::ConfigRead {
                            path: config_path.clone(),
                            reason: e.to_string(),
                        }
                    })?;
                debug!("Config loaded from {}", config_path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Config file not found at {}", config_path.display());
                Ok(AnalyticsConfig::default())
            }
            Err(e) => Err(AnalyticsError::ConfigRead {
                path: config_path,
                reason: e.to_string(),
            }),
        }
    }

    /// Overwrite the configuration file, creating the data directory if needed
    pub fn persist(&self, data_dir: &Path) -> Result<(), AnalyticsError> {
        let config_path = get_configuration_file_path(data_dir);
        let write_error = |source| AnalyticsError::ConfigWrite {
            path: config_path.clone(),
            source,
        };

        fs::create_dir_all(data_dir).map_err(write_error)?;
        let config_str = serde_json::to_string(self).map_err(|e| write_error(e.into()))?;
        fs::write(&config_path, config_str).map_err(write_error)?;
        debug!("Config written to {}", config_path.display());

        Ok(())
    }

    pub fn set_opt_out(data_dir: &Path, disabled: bool) -> Result<(), AnalyticsError> {
        AnalyticsConfig {
            is_analytics_disabled: disabled,
        }
        .persist(data_dir)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_load_missing_file_defaults_to_enabled() {
        let dir = tempdir().unwrap();
        let config = AnalyticsConfig::load(&dir.path().join("does-not-exist")).unwrap();
        assert!(!config.is_analytics_disabled);
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn test_set_opt_out_then_load(#[case] disabled: bool) {
        let dir = tempdir().unwrap();
        AnalyticsConfig::set_opt_out(dir.path(), disabled).unwrap();

        let config = AnalyticsConfig::load(dir.path()).unwrap();
        assert_eq!(config.is_analytics_disabled, disabled);
    }

    #[test]
    fn test_set_opt_out_creates_data_dir() {
        let dir = tempdir().unwrap();
        let data_dir = dir.path().join("plugins").join("analytics");

        AnalyticsConfig::set_opt_out(&data_dir, true).unwrap();

        let content = fs::read_to_string(data_dir.join(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(content, r#"{"is_analytics_disabled":true}"#);
    }

    #[test]
    fn test_off_then_on_overwrites() {
        let dir = tempdir().unwrap();
        AnalyticsConfig::set_opt_out(dir.path(), true).unwrap();
        AnalyticsConfig::set_opt_out(dir.path(), false).unwrap();

        let config = AnalyticsConfig::load(dir.path()).unwrap();
        assert!(!config.is_analytics_disabled);
    }

    #[test]
    fn test_load_accepts_missing_field() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "{}").unwrap();

        let config = AnalyticsConfig::load(dir.path()).unwrap();
        assert!(!config.is_analytics_disabled);
    }

    #[test]
    fn test_load_invalid_file_fails() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "is_analytics_disabled: yes").unwrap();

        let err = AnalyticsConfig::load(dir.path()).unwrap_err();
        assert!(matches!(err, AnalyticsError::ConfigRead { .. }));
    }

    #[test]
    fn test_persist_into_file_path_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = AnalyticsConfig::set_opt_out(&blocker, true).unwrap_err();
        assert!(matches!(err, AnalyticsError::ConfigWrite { .. }));
    }
}
