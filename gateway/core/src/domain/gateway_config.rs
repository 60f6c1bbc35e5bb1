// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Gateway Configuration Types
//
// Defines the configuration manifest for a scatter-gather gateway node:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP listener settings
// - Aggregation SLA
// - Per-dependency criticality and simulated latency/failure
// - Per-request simulation overrides (off by default)
// - Observability settings
//
// The aggregation core never reads this type; the CLI turns it into plain
// constructor parameters.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::domain::chat::ChatCriticality;
use crate::domain::dependency::Criticality;

pub const API_VERSION: &str = "scatter-gather/v1";
pub const KIND: &str = "GatewayConfig";
pub const CONFIG_PATH_ENV: &str = "SCATTER_GATHER_CONFIG_PATH";
pub const SLA_ENV: &str = "SCATTER_GATHER_SLA";
pub const ALLOW_OVERRIDES_ENV: &str = "SCATTER_GATHER_ALLOW_OVERRIDES";

/// Top-level Kubernetes-style gateway configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfigManifest {
    /// API version (must be "scatter-gather/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "GatewayConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: GatewayConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Human-readable gateway name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub dependencies: DependenciesConfig,

    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub observability: Option<ObservabilityConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Hard end-to-end deadline for one aggregation (e.g. "200ms")
    #[serde(with = "humantime_serde", default = "default_sla")]
    pub sla: Duration,
}

/// Simulated behavior of one downstream dependency.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencySettings {
    /// Overrides the dependency's default criticality
    #[serde(skip_serializing_if = "Option::is_none")]
    pub criticality: Option<Criticality>,

    /// Simulated latency before answering (e.g. "50ms")
    #[serde(with = "humantime_serde", default)]
    pub latency: Duration,

    /// Answer with an error instead of a payload
    #[serde(default)]
    pub fail: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsSettings {
    #[serde(flatten)]
    pub settings: DependencySettings,

    /// Value reported in `permissions.allowed`
    #[serde(default = "default_true")]
    pub allowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependenciesConfig {
    #[serde(default = "default_user_settings")]
    pub user: DependencySettings,

    #[serde(default = "default_permissions_settings")]
    pub permissions: PermissionsSettings,

    #[serde(default = "default_vector_memory_settings")]
    pub vector_memory: DependencySettings,
}

impl DependenciesConfig {
    /// Resolve configured criticality, falling back to the built-in defaults
    pub fn criticality(&self) -> ChatCriticality {
        let defaults = ChatCriticality::default();
        ChatCriticality {
            user: self.user.criticality.unwrap_or(defaults.user),
            permissions: self.permissions.settings.criticality.unwrap_or(defaults.permissions),
            vector_memory: self.vector_memory.criticality.unwrap_or(defaults.vector_memory),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Accept `*_delay` / `*_fail` query parameters that build a private
    /// dependency set for that single request
    #[serde(default)]
    pub allow_request_overrides: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Prometheus exporter port; exporter disabled when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics_port: Option<u16>,
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_sla() -> Duration {
    Duration::from_millis(200)
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_user_settings() -> DependencySettings {
    DependencySettings {
        criticality: None,
        latency: Duration::from_millis(10),
        fail: false,
    }
}

fn default_permissions_settings() -> PermissionsSettings {
    PermissionsSettings {
        settings: DependencySettings {
            criticality: None,
            latency: Duration::from_millis(50),
            fail: false,
        },
        allowed: true,
    }
}

fn default_vector_memory_settings() -> DependencySettings {
    DependencySettings {
        criticality: None,
        latency: Duration::from_millis(100),
        fail: false,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self { sla: default_sla() }
    }
}

impl Default for DependenciesConfig {
    fn default() -> Self {
        Self {
            user: default_user_settings(),
            permissions: default_permissions_settings(),
            vector_memory: default_vector_memory_settings(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

impl Default for GatewayConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "scatter-gather".to_string(),
                labels: None,
            },
            spec: GatewayConfigSpec::default(),
        }
    }
}

impl GatewayConfigManifest {
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

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. SCATTER_GATHER_CONFIG_PATH environment variable
    /// 2. ./scatter-gather.yaml (working directory)
    /// 3. ~/.scatter-gather/config.yaml (user home)
    /// 4. /etc/scatter-gather/config.yaml (Unix only)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./scatter-gather.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".scatter-gather").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/scatter-gather/config.yaml");
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
            let mut config = Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?;
            config.apply_env_overrides();
            return Ok(config);
        }

        let mut config = if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup (environment in production)
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup(SLA_ENV) {
            match humantime::parse_duration(val.trim()) {
                Ok(sla) => {
                    tracing::info!("Environment override: {}={:?}", SLA_ENV, sla);
                    self.spec.aggregation.sla = sla;
                }
                Err(e) => {
                    tracing::warn!(
                        "Invalid value for {}: '{}' ({}). Ignoring.",
                        SLA_ENV,
                        val,
                        e
                    );
                }
            }
        }

        if let Some(val) = lookup(ALLOW_OVERRIDES_ENV) {
            match parse_bool(&val) {
                Some(allow) => {
                    tracing::info!("Environment override: {}={}", ALLOW_OVERRIDES_ENV, allow);
                    self.spec.simulation.allow_request_overrides = allow;
                }
                None => {
                    tracing::warn!(
                        "Invalid value for {}: '{}'. Expected true/false. Ignoring.",
                        ALLOW_OVERRIDES_ENV,
                        val
                    );
                }
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.server.port == 0 {
            anyhow::bail!("spec.server.port cannot be 0");
        }

        if self.spec.aggregation.sla.is_zero() {
            anyhow::bail!("spec.aggregation.sla must be greater than zero");
        }

        if std::time::Instant::now()
            .checked_add(self.spec.aggregation.sla)
            .is_none()
        {
            anyhow::bail!(
                "spec.aggregation.sla is too large: {}",
                humantime::format_duration(self.spec.aggregation.sla)
            );
        }

        let criticality = self.spec.dependencies.criticality();
        let any_critical = [criticality.user, criticality.permissions, criticality.vector_memory]
            .iter()
            .any(|c| *c == Criticality::Critical);
        if !any_critical {
            anyhow::bail!("At least one dependency must be critical");
        }

        Ok(())
    }
}
