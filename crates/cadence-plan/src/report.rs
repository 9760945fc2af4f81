//! Per-iteration metrics and recommendations.

#![allow(clippy::cast_precision_loss)]

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use cadence_core::model::PriorityTier;
use serde::Serialize;

use crate::capacity::{CapacityProfile, HOURS_PER_POINT, utilization_percent};
use crate::graph::{Backlog, Families};
use crate::risk::{RiskAssessment, RiskLevel};

const HIGH_UTILIZATION: f64 = 90.0;
const URGENT_SHARE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationMetrics {
    pub item_count: usize,
    pub total_points: u64,
    /// `total_points × 8`.
    pub total_hours: f64,
    pub capacity_points: u32,
    pub capacity_hours: f64,
    /// Percent of buffered point capacity used; `inf` against zero capacity.
    pub point_utilization: f64,
    pub hour_utilization: f64,
    pub tier_distribution: BTreeMap<PriorityTier, usize>,
    pub average_business_value: f64,
    pub average_complexity: f64,
    pub is_over_capacity: bool,
}

impl IterationMetrics {
    #[must_use]
    pub fn compute(backlog: &Backlog, members: &[usize], capacity: &CapacityProfile) -> Self {
        let scored: Vec<_> = members.iter().map(|&idx| backlog.get(idx)).collect();

        let total_points: u64 = scored.iter().map(|s| u64::from(s.points())).sum();
        let total_hours = total_points as f64 * HOURS_PER_POINT;

        let mut tier_distribution = BTreeMap::new();
        for s in &scored {
            *tier_distribution.entry(s.score.tier).or_insert(0) += 1;
        }

        let mean = |sum: u32| {
            if scored.is_empty() {
                0.0
            } else {
                f64::from(sum) / scored.len() as f64
            }
        };
        let business_value: u32 = scored.iter().map(|s| u32::from(s.item.business_value)).sum();
        let complexity: u32 = scored.iter().map(|s| u32::from(s.item.complexity)).sum();

        Self {
            item_count: scored.len(),
            total_points,
            total_hours,
            capacity_points: capacity.total_story_points,
            capacity_hours: capacity.total_hours,
            point_utilization: utilization_percent(
                total_points as f64,
                f64::from(capacity.total_story_points),
            ),
            hour_utilization: utilization_percent(total_hours, capacity.total_hours),
            tier_distribution,
            average_business_value: mean(business_value),
            average_complexity: mean(complexity),
            is_over_capacity: total_points > u64::from(capacity.total_story_points),
        }
    }

    /// Items in the critical or high tier.
    #[must_use]
    pub fn urgent_count(&self) -> usize {
        self.tier_distribution
            .iter()
            .filter(|(tier, _)| tier.is_urgent())
            .map(|(_, count)| count)
            .sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    HighUtilization,
    HighRisk,
    UnresolvedDependencies,
    PriorityImbalance,
}

impl fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::HighUtilization => "high utilization",
            Self::HighRisk => "high risk",
            Self::UnresolvedDependencies => "unresolved dependencies",
            Self::PriorityImbalance => "priority imbalance",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub message: String,
    pub item_ids: Vec<String>,
}

/// Recommendations for the iteration at zero-based `index`.
///
/// `placement[i]` is the iteration index of backlog item `i`, `None` when
/// it was left unscheduled. A dependency is unresolved when it is not
/// placed in this or an earlier iteration (external ids included).
#[must_use]
pub fn recommendations(
    backlog: &Backlog,
    members: &[usize],
    index: usize,
    placement: &[Option<usize>],
    metrics: &IterationMetrics,
    risk: &RiskAssessment,
) -> Vec<Recommendation> {
    let mut out = Vec::new();

    if metrics.point_utilization > HIGH_UTILIZATION {
        out.push(Recommendation {
            kind: RecommendationKind::HighUtilization,
            message: format!(
                "Point utilization is {}; leave slack for unplanned work",
                format_percent(metrics.point_utilization)
            ),
            item_ids: Vec::new(),
        });
    }

    if risk.level == RiskLevel::High {
        out.push(Recommendation {
            kind: RecommendationKind::HighRisk,
            message: format!(
                "Overall risk {:.1} is high; review the mitigations before committing",
                risk.overall
            ),
            item_ids: Vec::new(),
        });
    }

    let mut blocked_items = Vec::new();
    let mut missing: BTreeSet<&str> = BTreeSet::new();
    for &idx in members {
        let item = &backlog.get(idx).item;
        let unresolved: Vec<&str> = item
            .dependencies
            .iter()
            .map(String::as_str)
            .filter(|dep| {
                backlog
                    .index_of(dep)
                    .and_then(|d| placement.get(d).copied().flatten())
                    .is_none_or(|at| at > index)
            })
            .collect();
        if !unresolved.is_empty() {
            blocked_items.push(item.id.clone());
            missing.extend(unresolved);
        }
    }
    if !blocked_items.is_empty() {
        out.push(Recommendation {
            kind: RecommendationKind::UnresolvedDependencies,
            message: format!(
                "Dependencies not delivered by this iteration: {}",
                missing.into_iter().collect::<Vec<_>>().join(", ")
            ),
            item_ids: blocked_items,
        });
    }

    if metrics.item_count > 0 {
        let share = metrics.urgent_count() as f64 / metrics.item_count as f64;
        if share > URGENT_SHARE {
            out.push(Recommendation {
                kind: RecommendationKind::PriorityImbalance,
                message: format!(
                    "{} of items are critical or high; mix in lower-priority work to absorb slippage",
                    format_percent(share * 100.0)
                ),
                item_ids: Vec::new(),
            });
        }
    }

    out
}

/// Families with members in more than one iteration (or left unscheduled),
/// as item-id lists in input order.
#[must_use]
pub fn split_families(
    backlog: &Backlog,
    families: &Families,
    placement: &[Option<usize>],
) -> Vec<Vec<String>> {
    (0..families.count())
        .map(|family| families.members(family))
        .filter(|members| {
            let spots: BTreeSet<Option<usize>> =
                members.iter().map(|&idx| placement[idx]).collect();
            spots.len() > 1
        })
        .map(|members| {
            members
                .into_iter()
                .map(|idx| backlog.get(idx).id().to_string())
                .collect()
        })
        .collect()
}

fn format_percent(value: f64) -> String {
    if value.is_finite() {
        format!("{value:.0}%")
    } else {
        "unbounded (no capacity)".to_string()
    }
}
