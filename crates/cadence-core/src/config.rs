use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::plan::{default_iteration_length_days, default_velocity_buffer_factor};
use crate::model::{CapacityConfig, PriorityWeights, RiskThresholds};

/// Seconds to wait for an external goal-text generator per iteration.
pub const DEFAULT_GOAL_TIMEOUT_SECS: u64 = 30;

/// Effective planning configuration, as read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlanConfig {
    #[serde(default)]
    pub capacity: CapacitySection,
    #[serde(default)]
    pub weights: PriorityWeights,
    #[serde(default)]
    pub risk: RiskThresholds,
    #[serde(default)]
    pub goals: GoalConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacitySection {
    #[serde(default = "default_iteration_length_days")]
    pub iteration_length_days: u32,
    #[serde(default = "default_velocity_buffer_factor")]
    pub velocity_buffer_factor: f64,
}

impl Default for CapacitySection {
    fn default() -> Self {
        Self {
            iteration_length_days: default_iteration_length_days(),
            velocity_buffer_factor: default_velocity_buffer_factor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalConfig {
    #[serde(default = "default_goal_timeout_secs")]
    pub timeout_secs: u64,
    /// External program used to generate goal text. When unset, the
    /// deterministic summarizer is used for every iteration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

const fn default_goal_timeout_secs() -> u64 {
    DEFAULT_GOAL_TIMEOUT_SECS
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_goal_timeout_secs(),
            command: None,
        }
    }
}

impl PlanConfig {
    /// The engine-facing view of this configuration.
    #[must_use]
    pub const fn capacity_config(&self) -> CapacityConfig {
        CapacityConfig {
            iteration_length_days: self.capacity.iteration_length_days,
            velocity_buffer_factor: self.capacity.velocity_buffer_factor,
            priority_weights: self.weights,
            risk_thresholds: self.risk,
        }
    }

    /// Serialize back to TOML, e.g. for `cadence config`.
    ///
    /// # Errors
    ///
    /// Returns an error if TOML serialization fails.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize config to TOML")
    }
}

/// Where the effective configuration was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum ConfigSource {
    Explicit(PathBuf),
    Project(PathBuf),
    User(PathBuf),
    Defaults,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveConfig {
    pub config: PlanConfig,
    pub source: ConfigSource,
}

/// Path of the project-local configuration file.
#[must_use]
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".cadence/config.toml")
}

/// Read and parse a config file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config_file(path: &Path) -> Result<PlanConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<PlanConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load `.cadence/config.toml` under `project_root`, if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_project_config(project_root: &Path) -> Result<Option<PlanConfig>> {
    let path = project_config_path(project_root);
    if !path.exists() {
        return Ok(None);
    }
    load_config_file(&path).map(Some)
}

/// Load `<config dir>/cadence/config.toml`, if present.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_user_config() -> Result<Option<(PathBuf, PlanConfig)>> {
    let Some(config_dir) = dirs::config_dir() else {
        return Ok(None);
    };

    let path = config_dir.join("cadence/config.toml");
    if !path.exists() {
        return Ok(None);
    }

    let config = load_config_file(&path)?;
    Ok(Some((path, config)))
}

/// Resolve the configuration for a run.
///
/// Precedence (first match wins): `explicit` path, project config, user
/// config, built-in defaults. An explicit path that does not exist is an
/// error; missing implicit files are not.
///
/// # Errors
///
/// Returns an error when a config file that should be used cannot be read
/// or parsed.
pub fn resolve_config(project_root: &Path, explicit: Option<&Path>) -> Result<EffectiveConfig> {
    if let Some(path) = explicit {
        let config = load_config_file(path)?;
        return Ok(EffectiveConfig {
            config,
            source: ConfigSource::Explicit(path.to_path_buf()),
        });
    }

    if let Some(config) = load_project_config(project_root)? {
        return Ok(EffectiveConfig {
            config,
            source: ConfigSource::Project(project_config_path(project_root)),
        });
    }

    if let Some((path, config)) = load_user_config()? {
        return Ok(EffectiveConfig {
            config,
            source: ConfigSource::User(path),
        });
    }

    tracing::debug!("no config file found, using defaults");
    Ok(EffectiveConfig {
        config: PlanConfig::default(),
        source: ConfigSource::Defaults,
    })
}
