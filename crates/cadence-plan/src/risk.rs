//! Five-factor additive risk model for a single iteration.
//!
//! Each factor is computed independently and is nonnegative:
//!
//! | factor | formula |
//! |--------|---------|
//! | technical complexity | `Σ complexity × 0.02` |
//! | dependency | `0.3 × Σ 0.5 per relation leaving the iteration` |
//! | capacity | step function of point utilization |
//! | uncertainty | `Σ risk × 0.025` |
//! | velocity | `min(2, index × 0.1)` |
//!
//! The overall score is the clamped sum; the confidence value is a display
//! heuristic derived from how evenly the factors are spread.

#![allow(clippy::cast_precision_loss)]

use std::collections::HashSet;
use std::fmt;

use cadence_core::model::RiskThresholds;
use serde::Serialize;

use crate::capacity::utilization_percent;
use crate::graph::Backlog;

const COMPLEXITY_WEIGHT: f64 = 0.02;
const UNCERTAINTY_WEIGHT: f64 = 0.025;
const DEPENDENCY_SCALE: f64 = 0.3;
const ABSENT_RELATION: f64 = 0.5;
const VELOCITY_STEP: f64 = 0.1;
const VELOCITY_CAP: f64 = 2.0;
const MAX_RISK: f64 = 5.0;
const MIN_CONFIDENCE: f64 = 0.1;

/// Qualitative bucket for the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// `< low` → very low, `< medium` → low, `< high` → medium, else high.
    #[must_use]
    pub fn from_score(score: f64, thresholds: &RiskThresholds) -> Self {
        if score < thresholds.low {
            Self::VeryLow
        } else if score < thresholds.medium {
            Self::Low
        } else if score < thresholds.high {
            Self::Medium
        } else {
            Self::High
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VeryLow => "very-low",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-factor contributions and the combined score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskFactors {
    pub technical_complexity: f64,
    pub dependency: f64,
    pub capacity: f64,
    pub uncertainty: f64,
    pub velocity: f64,
}

impl RiskFactors {
    #[must_use]
    pub const fn as_array(&self) -> [f64; 5] {
        [
            self.technical_complexity,
            self.dependency,
            self.capacity,
            self.uncertainty,
            self.velocity,
        ]
    }

    #[must_use]
    pub fn total(&self) -> f64 {
        self.as_array().iter().sum()
    }
}

/// Risk assessment attached to one iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskAssessment {
    pub factors: RiskFactors,
    /// Sum of the factors, clamped to `[0, 5]`.
    pub overall: f64,
    pub level: RiskLevel,
    /// `max(0.1, 1 - variance(factors) / 10)`.
    pub confidence: f64,
}

/// One item's relations that point outside its iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbsentRelations {
    pub item_id: String,
    /// Children of this item placed in other iterations.
    pub children: Vec<String>,
    /// This item's parent, when it is placed elsewhere or not in the batch.
    pub parent: Option<String>,
    /// Dependency ids not in this iteration, external ones included.
    pub dependencies: Vec<String>,
}

impl AbsentRelations {
    #[must_use]
    pub fn count(&self) -> usize {
        self.children.len() + usize::from(self.parent.is_some()) + self.dependencies.len()
    }
}

/// Relations of every item in `members` that cross the iteration boundary.
/// Items with none are omitted.
#[must_use]
pub fn absent_relations(backlog: &Backlog, members: &[usize]) -> Vec<AbsentRelations> {
    let present: HashSet<&str> = members.iter().map(|&idx| backlog.get(idx).id()).collect();

    members
        .iter()
        .filter_map(|&idx| {
            let item = &backlog.get(idx).item;
            let children: Vec<String> = backlog
                .child_ids(idx)
                .into_iter()
                .filter(|id| !present.contains(id))
                .map(str::to_string)
                .collect();
            let parent = item
                .parent_id
                .as_deref()
                .filter(|pid| !present.contains(pid))
                .map(str::to_string);
            let dependencies: Vec<String> = item
                .dependencies
                .iter()
                .filter(|dep| !present.contains(dep.as_str()))
                .cloned()
                .collect();

            let relations = AbsentRelations {
                item_id: item.id.clone(),
                children,
                parent,
                dependencies,
            };
            (relations.count() > 0).then_some(relations)
        })
        .collect()
}

/// Step function over point utilization in percent.
#[must_use]
pub fn capacity_risk(utilization: f64) -> f64 {
    if utilization > 100.0 {
        5.0
    } else if utilization > 90.0 {
        3.5
    } else if utilization > 80.0 {
        2.0
    } else if utilization > 70.0 {
        1.0
    } else {
        0.5
    }
}

/// Assess the iteration at zero-based `index` holding `members`.
#[must_use]
pub fn assess(
    backlog: &Backlog,
    members: &[usize],
    index: u32,
    capacity_points: u32,
    thresholds: &RiskThresholds,
) -> RiskAssessment {
    let items = members.iter().map(|&idx| &backlog.get(idx).item);

    let complexity: u32 = items.clone().map(|i| u32::from(i.complexity)).sum();
    let uncertainty: u32 = items.clone().map(|i| u32::from(i.risk)).sum();
    let points: f64 = items.map(|i| f64::from(i.points)).sum();

    let absent: usize = absent_relations(backlog, members)
        .iter()
        .map(AbsentRelations::count)
        .sum();

    let utilization = utilization_percent(points, f64::from(capacity_points));

    let factors = RiskFactors {
        technical_complexity: f64::from(complexity) * COMPLEXITY_WEIGHT,
        dependency: DEPENDENCY_SCALE * ABSENT_RELATION * absent as f64,
        capacity: capacity_risk(utilization),
        uncertainty: f64::from(uncertainty) * UNCERTAINTY_WEIGHT,
        velocity: (f64::from(index) * VELOCITY_STEP).min(VELOCITY_CAP),
    };

    let overall = factors.total().clamp(0.0, MAX_RISK);
    RiskAssessment {
        level: RiskLevel::from_score(overall, thresholds),
        confidence: confidence(&factors.as_array()),
        factors,
        overall,
    }
}

fn confidence(factors: &[f64]) -> f64 {
    let n = factors.len() as f64;
    let mean = factors.iter().sum::<f64>() / n;
    let variance = factors.iter().map(|f| (f - mean).powi(2)).sum::<f64>() / n;
    (1.0 - variance / 10.0).max(MIN_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use cadence_core::model::WorkItem;

    use super::*;
    use crate::score::PriorityScorer;

    fn backlog(items: &[WorkItem]) -> Backlog {
        Backlog::new(items, &PriorityScorer::default())
    }

    fn approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "actual ({actual}) != expected ({expected})"
        );
    }

    #[test]
    fn capacity_steps() {
        approx(capacity_risk(101.0), 5.0);
        approx(capacity_risk(100.0), 3.5);
        approx(capacity_risk(90.0), 2.0);
        approx(capacity_risk(80.0), 1.0);
        approx(capacity_risk(70.0), 0.5);
        approx(capacity_risk(f64::INFINITY), 5.0);
    }

    #[test]
    fn levels_follow_thresholds() {
        let t = RiskThresholds::default();
        assert_eq!(RiskLevel::from_score(1.9, &t), RiskLevel::VeryLow);
        assert_eq!(RiskLevel::from_score(2.0, &t), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(3.5, &t), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_score(5.0, &t), RiskLevel::High);
    }

    #[test]
    fn simple_iteration_factors() {
        let b = backlog(&[
            WorkItem::new("a", "A", 4).with_scores(3, 3, 4, 2),
            WorkItem::new("b", "B", 4).with_scores(3, 3, 2, 4),
        ]);
        let risk = assess(&b, &[0, 1], 0, 10, &RiskThresholds::default());

        approx(risk.factors.technical_complexity, 0.12);
        approx(risk.factors.dependency, 0.0);
        // 8 / 10 = 80% is not above 80.
        approx(risk.factors.capacity, 1.0);
        approx(risk.factors.uncertainty, 0.15);
        approx(risk.factors.velocity, 0.0);
        approx(risk.overall, 1.27);
        assert_eq!(risk.level, RiskLevel::VeryLow);
    }

    #[test]
    fn oversized_single_item_is_capacity_critical() {
        let b = backlog(&[WorkItem::new("big", "Big", 50)]);
        let risk = assess(&b, &[0], 0, 10, &RiskThresholds::default());
        approx(risk.factors.capacity, 5.0);
        approx(risk.overall, 5.0);
        assert_eq!(risk.level, RiskLevel::High);
    }

    #[test]
    fn relations_crossing_the_boundary_add_dependency_risk() {
        let b = backlog(&[
            WorkItem::new("epic", "Epic", 5),
            WorkItem::new("c1", "C1", 4).with_parent("epic"),
            WorkItem::new("c2", "C2", 4).with_parent("epic"),
            WorkItem::new("x", "X", 1).with_dependencies(["ext-1", "c1"]),
        ]);

        // Iteration {epic, c1}: epic misses c2 → 0.5.
        let first = assess(&b, &[0, 1], 0, 10, &RiskThresholds::default());
        approx(first.factors.dependency, 0.3 * 0.5);

        // Iteration {c2, x}: c2's parent absent, x misses ext-1 and c1.
        let second = assess(&b, &[2, 3], 1, 10, &RiskThresholds::default());
        approx(second.factors.dependency, 0.3 * 1.5);
        approx(second.factors.velocity, 0.1);

        let relations = absent_relations(&b, &[2, 3]);
        assert_eq!(relations.len(), 2);
        assert_eq!(relations[0].parent.as_deref(), Some("epic"));
        assert_eq!(relations[1].dependencies, vec!["ext-1", "c1"]);
    }

    #[test]
    fn velocity_is_capped() {
        let b = backlog(&[WorkItem::new("a", "A", 1)]);
        let risk = assess(&b, &[0], 30, 10, &RiskThresholds::default());
        approx(risk.factors.velocity, 2.0);
    }

    #[test]
    fn confidence_has_floor() {
        approx(confidence(&[0.0; 5]), 1.0);
        approx(confidence(&[0.0, 0.0, 50.0, 0.0, 0.0]), 0.1);
    }
}
