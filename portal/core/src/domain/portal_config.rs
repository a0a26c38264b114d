// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Portal Configuration Types
//
// Defines the configuration schema for a grantflow portal node, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - Record store selection (in-memory or PostgreSQL)
// - Access policy overrides (explicit administrator allow-list)
// - Notification sender selection
// - HTTP API and observability settings

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::repository::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "grantflow.dev/v1";
pub const KIND: &str = "PortalConfig";

/// Top-level Kubernetes-style portal configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfigManifest {
    /// API version (must be "grantflow.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "PortalConfig")
    pub kind: String,

    /// Portal metadata (name, labels, version)
    pub metadata: ManifestMetadata,

    /// Portal configuration specification
    pub spec: PortalConfigSpec,
}

/// Manifest metadata (Kubernetes-style)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PortalConfigSpec {
    /// Record store; absent means in-memory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub access: AccessConfig,

    #[serde(default)]
    pub notifications: NotificationConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Emails always resolved to the admin role
    #[serde(default)]
    pub admin_overrides: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Inbox for "submitted" notifications to foundation staff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_email: Option<String>,

    /// Delivery webhook; absent means intents are only logged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,

    /// Upper bound on one webhook call, connect through response
    #[serde(default = "default_webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            staff_email: None,
            webhook_url: None,
            webhook_timeout_secs: default_webhook_timeout_secs(),
        }
    }
}

impl NotificationConfig {
    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus exporter port; absent disables the exporter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

fn default_max_connections() -> u32 {
    5
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_webhook_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PortalConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "grantflow-portal".to_string(),
                version: Some("1.0.0".to_string()),
                labels: None,
            },
            spec: PortalConfigSpec::default(),
        }
    }
}

impl PortalConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. GRANTFLOW_CONFIG_PATH environment variable
    /// 2. ./grantflow-config.yaml (working directory)
    /// 3. ~/.grantflow/config.yaml (user home)
    /// 4. /etc/grantflow/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GRANTFLOW_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./grantflow-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".grantflow").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/grantflow/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails hard when missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Same as [`Self::apply_env_overrides`] with an injectable lookup.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("GRANTFLOW_DATABASE_URL").filter(|v| !v.trim().is_empty()) {
            tracing::info!("Environment override: GRANTFLOW_DATABASE_URL");
            match self.spec.database.as_mut() {
                Some(database) => database.url = url,
                None => {
                    self.spec.database = Some(DatabaseConfig {
                        url,
                        max_connections: default_max_connections(),
                    })
                }
            }
        }

        if let Some(email) = lookup("GRANTFLOW_STAFF_EMAIL").filter(|v| !v.trim().is_empty()) {
            tracing::info!("Environment override: GRANTFLOW_STAFF_EMAIL");
            self.spec.notifications.staff_email = Some(email);
        }

        if let Some(list) = lookup("GRANTFLOW_ADMIN_OVERRIDES") {
            let emails: Vec<String> = list
                .split(',')
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect();
            tracing::info!(count = emails.len(), "Environment override: GRANTFLOW_ADMIN_OVERRIDES");
            self.spec.access.admin_overrides = emails;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!("Invalid apiVersion: '{}'. Must be '{}'", self.api_version, API_VERSION);
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if let Some(database) = &self.spec.database {
            if database.url.trim().is_empty() {
                anyhow::bail!("spec.database.url cannot be empty");
            }
            if database.max_connections == 0 {
                anyhow::bail!("spec.database.max_connections must be greater than zero");
            }
        }

        if let Some(url) = &self.spec.notifications.webhook_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("spec.notifications.webhook_url must start with http:// or https://");
            }
        }
        if self.spec.notifications.webhook_timeout_secs == 0 {
            anyhow::bail!("spec.notifications.webhook_timeout_secs must be greater than zero");
        }

        for email in &self.spec.access.admin_overrides {
            if !email.contains('@') {
                anyhow::bail!("Invalid admin override email: '{}'", email);
            }
        }

        Ok(())
    }

    pub fn storage_backend(&self) -> StorageBackend {
        match &self.spec.database {
            Some(database) => StorageBackend::PostgreSQL(PostgresConfig {
                connection_string: database.url.clone(),
                max_connections: database.max_connections,
            }),
            None => StorageBackend::InMemory,
        }
    }

    pub fn log_level(&self) -> &str {
        self.spec
            .observability
            .as_ref()
            .map(|o| o.log_level.as_str())
            .unwrap_or("info")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = PortalConfigManifest::default();
        assert_eq!(manifest.api_version, API_VERSION);
        assert_eq!(manifest.kind, KIND);
        assert!(manifest.validate().is_ok());
        assert!(matches!(manifest.storage_backend(), StorageBackend::InMemory));
        assert_eq!(manifest.spec.api.port, 8080);
    }

    #[test]
    fn test_yaml_parsing_with_defaults() {
        let yaml = r#"
apiVersion: grantflow.dev/v1
kind: PortalConfig
metadata:
  name: foundation-portal
spec:
  database:
    url: postgres://grantflow@localhost/grantflow
  access:
    admin_overrides:
      - director@foundation.org
  notifications:
    staff_email: grants@foundation.org
"#;
        let manifest = PortalConfigManifest::from_yaml_str(yaml).unwrap();
        assert!(manifest.validate().is_ok());
        let database = manifest.spec.database.as_ref().unwrap();
        assert_eq!(database.max_connections, 5);
        assert_eq!(manifest.spec.api.bind_address, "0.0.0.0");
        assert_eq!(manifest.spec.access.admin_overrides, vec!["director@foundation.org"]);
        assert!(matches!(manifest.storage_backend(), StorageBackend::PostgreSQL(_)));
        assert_eq!(manifest.spec.notifications.webhook_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grantflow-config.yaml");
        let mut manifest = PortalConfigManifest::default();
        manifest.spec.notifications.webhook_url = Some(
            "https://hooks.example.org/notify".to_string(),
        );
        manifest.to_yaml_file(&path).unwrap();

        let loaded = PortalConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(
            loaded.spec.notifications.webhook_url.as_deref(),
            Some("https://hooks.example.org/notify")
        );
    }

    #[test]
    fn test_validation() {
        let mut manifest = PortalConfigManifest::default();
        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());

        let mut manifest = PortalConfigManifest::default();
        manifest.spec.notifications.webhook_url = Some("ftp://nope".to_string());
        assert!(manifest.validate().is_err());

        let mut manifest = PortalConfigManifest::default();
        manifest.spec.notifications.webhook_timeout_secs = 0;
        assert!(manifest.validate().is_err());

        let mut manifest = PortalConfigManifest::default();
        manifest.spec.access.admin_overrides = vec!["not-an-email".to_string()];
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_overrides_from_lookup() {
        let mut manifest = PortalConfigManifest::default();
        manifest.apply_overrides_from(|key| match key {
            "GRANTFLOW_DATABASE_URL" => Some("postgres://db/grants".to_string()),
            "GRANTFLOW_ADMIN_OVERRIDES" => Some(" a@f.org, ,b@f.org ".to_string()),
            _ => None,
        });
        assert_eq!(manifest.spec.database.unwrap().url, "postgres://db/grants");
        assert_eq!(manifest.spec.access.admin_overrides, vec!["a@f.org", "b@f.org"]);
        assert!(manifest.spec.notifications.staff_email.is_none());
    }

    #[test]
    fn test_missing_explicit_path_fails() {
        let missing = PathBuf::from("/definitely/not/here/grantflow.yaml");
        assert!(PortalConfigManifest::load_or_default(Some(missing)).is_err());
    }
}
