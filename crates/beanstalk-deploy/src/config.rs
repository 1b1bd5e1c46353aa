//! Container configuration
//!
//! Loaded from TOML; every section is optional and falls back to defaults.
//!
//! ```toml
//! enterprise_discovery = false
//! platform = "web"
//!
//! [naming]
//! bind_manager = true
//! manager_name = "beanstalk/BeanManager"
//!
//! [proxy]
//! name_suffix = "$$BeanstalkProxy"
//! ```

use crate::error::ConfigError;
use beanstalk_proxy::DEFAULT_PROXY_SUFFIX;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name the container binds itself under by default
pub const DEFAULT_MANAGER_NAME: &str = "beanstalk/BeanManager";

/// Environment the container runs in; decides the optional default beans
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformProfile {
    /// Plain application, no environment beans
    #[default]
    Standalone,
    /// Web container: principal
    Web,
    /// Full enterprise container: principal, validation, transactions
    Enterprise,
}

/// Naming service settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Bind the container self-reference at deployment
    pub bind_manager: bool,
    /// Name to bind under
    pub manager_name: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            bind_manager: true,
            manager_name: DEFAULT_MANAGER_NAME.to_string(),
        }
    }
}

/// Proxy synthesis settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Suffix appended to implementation type names
    pub name_suffix: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            name_suffix: DEFAULT_PROXY_SUFFIX.to_string(),
        }
    }
}

/// Container configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Ask the enterprise classifier about types that are not managed beans
    pub enterprise_discovery: bool,
    /// Platform profile
    pub platform: PlatformProfile,
    /// Naming settings
    pub naming: NamingConfig,
    /// Proxy settings
    pub proxy: ProxyConfig,
}

impl ContainerConfig {
    /// Parse a TOML document
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] if the document does not match the schema.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    /// Read and parse a TOML file
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Set the platform profile
    #[must_use]
    pub fn with_platform(mut self, platform: PlatformProfile) -> Self {
        self.platform = platform;
        self
    }

    /// Enable or disable enterprise classification
    #[must_use]
    pub fn with_enterprise_discovery(mut self, enabled: bool) -> Self {
        self.enterprise_discovery = enabled;
        self
    }

    /// Set the naming settings
    #[must_use]
    pub fn with_naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }

    /// Skip binding the container self-reference
    #[must_use]
    pub fn without_manager_binding(mut self) -> Self {
        self.naming.bind_manager = false;
        self
    }

    /// Set the proxy settings
    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxyConfig) -> Self {
        self.proxy = proxy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ContainerConfig::from_toml_str("").unwrap();
        assert_eq!(config, ContainerConfig::default());
        assert!(config.naming.bind_manager);
        assert_eq!(config.proxy.name_suffix, "$$BeanstalkProxy");
    }

    #[test]
    fn sections_override_defaults() {
        let config = ContainerConfig::from_toml_str(
            r#"
            platform = "enterprise"
            enterprise_discovery = true

            [naming]
            manager_name = "java/Manager"

            [proxy]
            name_suffix = "$$Woven"
            "#,
        )
        .unwrap();
        assert_eq!(config.platform, PlatformProfile::Enterprise);
        assert!(config.enterprise_discovery);
        assert_eq!(config.naming.manager_name, "java/Manager");
        assert!(config.naming.bind_manager);
        assert_eq!(config.proxy.name_suffix, "$$Woven");
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = ContainerConfig::from_toml_str("platform = \"mainframe\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "platform = \"web\"").unwrap();
        let config = ContainerConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.platform, PlatformProfile::Web);
    }

    #[test]
    fn builder_methods_compose() {
        let config = ContainerConfig::default()
            .with_platform(PlatformProfile::Web)
            .without_manager_binding();
        assert_eq!(config.platform, PlatformProfile::Web);
        assert!(!config.naming.bind_manager);
    }
}
