//! Allocation run parameters: capacity config, weights, thresholds and the
//! project context, plus the on-disk backlog document that bundles them.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::item::WorkItem;
use super::team::TeamMember;

/// Relative weights of the five priority factors.
///
/// Raw values need not sum to 100; they are normalized before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriorityWeights {
    #[serde(default = "default_business_value_weight")]
    pub business_value: f64,
    #[serde(default = "default_user_impact_weight")]
    pub user_impact: f64,
    #[serde(default = "default_complexity_weight")]
    pub complexity: f64,
    #[serde(default = "default_risk_weight")]
    pub risk: f64,
    #[serde(default = "default_dependencies_weight")]
    pub dependencies: f64,
}

const fn default_business_value_weight() -> f64 {
    30.0
}

const fn default_user_impact_weight() -> f64 {
    25.0
}

const fn default_complexity_weight() -> f64 {
    15.0
}

const fn default_risk_weight() -> f64 {
    15.0
}

const fn default_dependencies_weight() -> f64 {
    15.0
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            business_value: default_business_value_weight(),
            user_impact: default_user_impact_weight(),
            complexity: default_complexity_weight(),
            risk: default_risk_weight(),
            dependencies: default_dependencies_weight(),
        }
    }
}

impl PriorityWeights {
    /// Weights in factor order: business value, user impact, complexity,
    /// risk, dependencies.
    #[must_use]
    pub const fn as_array(&self) -> [f64; 5] {
        [
            self.business_value,
            self.user_impact,
            self.complexity,
            self.risk,
            self.dependencies,
        ]
    }

    #[must_use]
    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// Rescale so the five weights sum to 100.
    ///
    /// Returns the weights unchanged when their sum is not positive; input
    /// validation rejects that case before scoring.
    #[must_use]
    pub fn normalized(&self) -> Self {
        let sum = self.sum();
        if !sum.is_finite() || sum <= 0.0 {
            return *self;
        }
        let factor = 100.0 / sum;
        Self {
            business_value: self.business_value * factor,
            user_impact: self.user_impact * factor,
            complexity: self.complexity * factor,
            risk: self.risk * factor,
            dependencies: self.dependencies * factor,
        }
    }
}

/// Overall-risk cut points used to label an iteration's risk level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskThresholds {
    #[serde(default = "default_low_threshold")]
    pub low: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium: f64,
    #[serde(default = "default_high_threshold")]
    pub high: f64,
}

const fn default_low_threshold() -> f64 {
    2.0
}

const fn default_medium_threshold() -> f64 {
    3.5
}

const fn default_high_threshold() -> f64 {
    5.0
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            low: default_low_threshold(),
            medium: default_medium_threshold(),
            high: default_high_threshold(),
        }
    }
}

/// Per-run capacity and scoring configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapacityConfig {
    #[serde(default = "default_iteration_length_days")]
    pub iteration_length_days: u32,
    #[serde(default = "default_velocity_buffer_factor")]
    pub velocity_buffer_factor: f64,
    #[serde(default)]
    pub priority_weights: PriorityWeights,
    #[serde(default)]
    pub risk_thresholds: RiskThresholds,
}

pub const fn default_iteration_length_days() -> u32 {
    14
}

pub const fn default_velocity_buffer_factor() -> f64 {
    0.8
}

impl Default for CapacityConfig {
    fn default() -> Self {
        Self {
            iteration_length_days: default_iteration_length_days(),
            velocity_buffer_factor: default_velocity_buffer_factor(),
            priority_weights: PriorityWeights::default(),
            risk_thresholds: RiskThresholds::default(),
        }
    }
}

/// Project-level context shared by every iteration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub start_date: NaiveDate,
}

impl ProjectContext {
    #[must_use]
    pub const fn starting(start_date: NaiveDate) -> Self {
        Self {
            name: None,
            start_date,
        }
    }
}

/// A complete allocation request as stored on disk (JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacklogDocument {
    pub project: ProjectContext,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default)]
    pub items: Vec<WorkItem>,
}

impl BacklogDocument {
    /// Parse a backlog document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid backlog document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("parse backlog document")
    }

    /// Read and parse a backlog document from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx_eq(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= 1e-9,
            "actual ({actual}) != expected ({expected})"
        );
    }

    #[test]
    fn default_weights_sum_to_one_hundred() {
        assert_approx_eq(PriorityWeights::default().sum(), 100.0);
    }

    #[test]
    fn normalized_weights_sum_to_one_hundred() {
        let weights = PriorityWeights {
            business_value: 3.0,
            user_impact: 1.0,
            complexity: 1.0,
            risk: 0.0,
            dependencies: 0.0,
        };
        let normalized = weights.normalized();
        assert_approx_eq(normalized.sum(), 100.0);
        assert_approx_eq(normalized.business_value, 60.0);
        assert_approx_eq(normalized.user_impact, 20.0);
    }

    #[test]
    fn zero_weights_are_left_untouched() {
        let weights = PriorityWeights {
            business_value: 0.0,
            user_impact: 0.0,
            complexity: 0.0,
            risk: 0.0,
            dependencies: 0.0,
        };
        assert_eq!(weights.normalized(), weights);
    }

    #[test]
    fn backlog_document_parses_minimal_json() {
        let doc = BacklogDocument::from_json_str(
            r#"{
                "project": {"start_date": "2026-01-05"},
                "team": [{"id": "dev-1"}],
                "items": [{"id": "W-1", "title": "Login", "points": 3}]
            }"#,
        )
        .expect("parse");
        assert_eq!(doc.items.len(), 1);
        assert_eq!(doc.team.len(), 1);
        assert_eq!(
            doc.project.start_date,
            NaiveDate::from_ymd_opt(2026, 1, 5).expect("date")
        );
    }

    #[test]
    fn capacity_config_fills_defaults() {
        let config: CapacityConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(config, CapacityConfig::default());
    }
}
