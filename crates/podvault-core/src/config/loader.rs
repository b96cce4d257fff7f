//! Configuration file loading

use super::EngineConfig;
use crate::error::{Error, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use tracing::debug;

/// Configuration file names searched in the working directory
pub const CONFIG_FILE_NAMES: &[&str] = &["podvault.yaml", "podvault.yml"];

/// Environment variable overriding the kubectl binary
pub const KUBECTL_ENV: &str = "PODVAULT_KUBECTL";

impl EngineConfig {
    /// Load configuration from the specified path or search for it.
    ///
    /// Search order when no path is given:
    /// 1. `podvault.yaml` / `podvault.yml` in the working directory
    /// 2. `<user config dir>/podvault/config.yaml`
    /// 3. Built-in defaults
    ///
    /// `PODVAULT_KUBECTL` overrides the binary in every case.
    pub fn load(path: Option<&Utf8Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::find_config()? {
                Some(found) => Self::from_file(&found)?,
                None => {
                    debug!("No configuration file found, using defaults");
                    Self::default()
                }
            },
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml_ng::from_str(content)?;
        Ok(config)
    }

    fn from_file(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::config_not_found(path.as_str())
            } else {
                Error::Io(e)
            }
        })?;
        debug!("Loading configuration from {}", path);
        Self::from_yaml(&content)
    }

    fn find_config() -> Result<Option<Utf8PathBuf>> {
        let cwd = std::env::current_dir().map_err(Error::Io)?;
        let cwd = Utf8PathBuf::try_from(cwd)
            .map_err(|_| Error::invalid_config("Current directory path is not valid UTF-8"))?;

        for name in CONFIG_FILE_NAMES {
            let candidate = cwd.join(name);
            if candidate.exists() {
                return Ok(Some(candidate));
            }
        }

        let user_config = dirs::config_dir()
            .and_then(|dir| Utf8PathBuf::try_from(dir).ok())
            .map(|dir| dir.join("podvault").join("config.yaml"));

        Ok(user_config.filter(|p| p.exists()))
    }

    fn apply_env(&mut self) {
        if let Ok(kubectl) = std::env::var(KUBECTL_ENV) {
            if !kubectl.trim().is_empty() {
                self.kubectl = kubectl;
            }
        }
    }

    /// Check the configuration for values the engines cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.kubectl.trim().is_empty() {
            return Err(Error::invalid_config("kubectl binary must not be empty"));
        }
        if self.progress_capacity == 0 {
            return Err(Error::invalid_config(
                "progress_capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_PROGRESS_CAPACITY;
    use serial_test::serial;

    #[test]
    fn test_parse_partial_config_fills_defaults() {
        let yaml = r#"
kubectl: /usr/local/bin/kubectl
checksum: false
"#;
        let config = EngineConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.kubectl, "/usr/local/bin/kubectl");
        assert!(!config.checksum);
        assert_eq!(config.progress_capacity, DEFAULT_PROGRESS_CAPACITY);
        assert!(config.estimate_size);
        assert!(config.sync_on_commit);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = EngineConfig::default().with_progress_capacity(0);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("progress_capacity"));
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file() {
        let path = Utf8Path::new("/tmp/nonexistent-podvault-config-12345.yaml");
        let err = EngineConfig::load(Some(path)).unwrap_err();
        assert!(
            matches!(err, Error::ConfigNotFound { .. }),
            "Expected ConfigNotFound, got: {:?}",
            err
        );
    }

    #[test]
    #[serial]
    fn test_load_invalid_yaml() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("podvault.yaml");
        std::fs::write(&config_path, "kubectl: [[[").unwrap();

        let utf8_path = Utf8PathBuf::from_path_buf(config_path).expect("valid UTF-8");
        let err = EngineConfig::load(Some(&utf8_path)).unwrap_err();
        assert!(matches!(err, Error::YamlParse(_)));
    }

    #[test]
    #[serial]
    fn test_env_overrides_kubectl() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("podvault.yaml");
        std::fs::write(&config_path, "kubectl: from-file\nprogress_capacity: 8\n").unwrap();
        let utf8_path = Utf8PathBuf::from_path_buf(config_path).expect("valid UTF-8");

        std::env::set_var(KUBECTL_ENV, "/opt/kubectl");
        let config = EngineConfig::load(Some(&utf8_path));
        std::env::remove_var(KUBECTL_ENV);

        let config = config.unwrap();
        assert_eq!(config.kubectl, "/opt/kubectl");
        assert_eq!(config.progress_capacity, 8);
    }
}
