//! Rule-based mitigation suggestions tied to individual risk factors.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::graph::Backlog;
use crate::risk::{RiskAssessment, absent_relations};

const TECHNICAL_TRIGGER: f64 = 2.0;
const DEPENDENCY_TRIGGER: f64 = 1.5;
const CAPACITY_TRIGGER: f64 = 3.0;
const UNCERTAINTY_TRIGGER: f64 = 2.0;
const VELOCITY_TRIGGER: f64 = 1.0;

/// Items at or above this complexity/risk are named in split and
/// re-estimation suggestions.
const HOTSPOT_SCORE: u8 = 4;

/// Urgency of a mitigation, most urgent first when sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        })
    }
}

/// The risk factor a mitigation addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    TechnicalComplexity,
    Dependency,
    Capacity,
    Uncertainty,
    Velocity,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Mitigation {
    pub factor: RiskFactor,
    pub severity: Severity,
    pub action: String,
    /// Items the suggestion is about; empty for iteration-wide actions.
    pub item_ids: Vec<String>,
}

/// Suggest mitigations for an iteration, sorted critical → low.
#[must_use]
pub fn advise(backlog: &Backlog, members: &[usize], risk: &RiskAssessment) -> Vec<Mitigation> {
    let factors = &risk.factors;
    let items = || members.iter().map(|&idx| &backlog.get(idx).item);
    let mut out = Vec::new();

    if factors.technical_complexity > TECHNICAL_TRIGGER {
        let item_ids: Vec<String> = items()
            .filter(|i| i.complexity >= HOTSPOT_SCORE)
            .map(|i| i.id.clone())
            .collect();
        out.push(Mitigation {
            factor: RiskFactor::TechnicalComplexity,
            severity: Severity::High,
            action: "Split high-complexity items into smaller deliverables".to_string(),
            item_ids,
        });
    }

    if factors.dependency > DEPENDENCY_TRIGGER {
        let relations = absent_relations(backlog, members);
        let mut pending: BTreeSet<&str> = BTreeSet::new();
        for rel in &relations {
            pending.extend(rel.dependencies.iter().map(String::as_str));
            pending.extend(rel.parent.as_deref());
        }
        let action = if pending.is_empty() {
            "Keep split parent groups coordinated across iterations".to_string()
        } else {
            format!(
                "Resolve dependencies before the iteration starts: {}",
                pending.into_iter().collect::<Vec<_>>().join(", ")
            )
        };
        out.push(Mitigation {
            factor: RiskFactor::Dependency,
            severity: Severity::High,
            action,
            item_ids: relations.into_iter().map(|rel| rel.item_id).collect(),
        });
    }

    if factors.capacity > CAPACITY_TRIGGER {
        out.push(Mitigation {
            factor: RiskFactor::Capacity,
            severity: Severity::Critical,
            action: "Reduce iteration scope or add team capacity".to_string(),
            item_ids: Vec::new(),
        });
    }

    if factors.uncertainty > UNCERTAINTY_TRIGGER {
        let item_ids: Vec<String> = items()
            .filter(|i| i.risk >= HOTSPOT_SCORE)
            .map(|i| i.id.clone())
            .collect();
        out.push(Mitigation {
            factor: RiskFactor::Uncertainty,
            severity: Severity::Medium,
            action: "Re-estimate high-risk items before committing".to_string(),
            item_ids,
        });
    }

    if factors.velocity > VELOCITY_TRIGGER {
        out.push(Mitigation {
            factor: RiskFactor::Velocity,
            severity: Severity::Low,
            action: "Monitor velocity against the plan; later iterations are less certain"
                .to_string(),
            item_ids: Vec::new(),
        });
    }

    out.sort_by_key(|m| m.severity);
    out
}
