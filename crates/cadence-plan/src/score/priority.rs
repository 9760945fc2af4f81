use std::cmp::Ordering;

use cadence_core::model::{PriorityTier, PriorityWeights, WorkItem};
use serde::{Deserialize, Serialize};

/// Value subtracted from to invert complexity and risk on the 1–5 scale.
const INVERSION_BASE: f64 = 6.0;

/// Scores computed for one work item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemScore {
    /// Weighted composite in `[1, 5]`, rounded to one decimal.
    pub priority_score: f64,
    /// `clamp(3 - 0.5 * dependencies, 1, 5)`.
    pub dependency_score: f64,
    /// Explicit tier when the item carries one, otherwise derived from
    /// `priority_score`.
    pub tier: PriorityTier,
}

/// Weighted multi-factor priority scorer.
///
/// The weighted formula is
///
/// `P = (wBV*BV + wUI*UI + wC*(6-C) + wR*(6-R) + wD*D) / 100`
///
/// where the weights are normalized to sum to 100 and `D` is the
/// dependency score. Complexity and risk are inverted so that harder or
/// riskier work lowers priority.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriorityScorer {
    weights: PriorityWeights,
}

impl Default for PriorityScorer {
    fn default() -> Self {
        Self::new(&PriorityWeights::default())
    }
}

impl PriorityScorer {
    /// Build a scorer from raw weights; they are normalized here.
    #[must_use]
    pub fn new(weights: &PriorityWeights) -> Self {
        Self {
            weights: weights.normalized(),
        }
    }

    /// The normalized weights (summing to 100) this scorer applies.
    #[must_use]
    pub const fn weights(&self) -> &PriorityWeights {
        &self.weights
    }

    /// Score a single item.
    #[must_use]
    pub fn score(&self, item: &WorkItem) -> ItemScore {
        let dependency_score = dependency_score(item.dependencies.len());
        let priority_score = self.weighted_score(item, dependency_score);
        let tier = item
            .priority
            .unwrap_or_else(|| PriorityTier::from_score(priority_score));

        ItemScore {
            priority_score,
            dependency_score,
            tier,
        }
    }

    fn weighted_score(&self, item: &WorkItem, dependency_score: f64) -> f64 {
        let w = &self.weights;
        let sum = w.business_value * f64::from(item.business_value)
            + w.user_impact * f64::from(item.user_impact)
            + w.complexity * (INVERSION_BASE - f64::from(item.complexity))
            + w.risk * (INVERSION_BASE - f64::from(item.risk))
            + w.dependencies * dependency_score;

        round_one_decimal(sum / 100.0)
    }
}

/// Dependency factor: fewer dependencies score higher.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn dependency_score(dependency_count: usize) -> f64 {
    0.5f64.mul_add(-(dependency_count as f64), 3.0).clamp(1.0, 5.0)
}

/// Backlog order: priority score descending, dependency score ascending as
/// the tie-break.
#[must_use]
pub fn backlog_order(a: &ItemScore, b: &ItemScore) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| a.dependency_score.total_cmp(&b.dependency_score))
}

/// Scheduling order: tier descending, then priority score descending.
#[must_use]
pub fn schedule_order(a: &ItemScore, b: &ItemScore) -> Ordering {
    b.tier
        .cmp(&a.tier)
        .then_with(|| b.priority_score.total_cmp(&a.priority_score))
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
