//! Property tests over random backlogs.
//!
//! Backlogs are generated with random points, scores, intra-batch
//! dependencies and parent links (parents always point at an earlier item,
//! so parent chains are acyclic; dependency cycles are allowed).

use std::collections::HashMap;

use cadence_core::model::{CapacityConfig, ProjectContext, TeamMember, WorkItem};
use cadence_plan::allocate::{self as packing, MAX_ITERATIONS};
use cadence_plan::score::{PriorityScorer, dependency_score};
use cadence_plan::{AllocationPlan, allocate};
use chrono::NaiveDate;
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Shape {
    points: u32,
    scores: (u8, u8, u8, u8),
    deps: Vec<usize>,
    parent: Option<usize>,
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    (
        0u32..=13,
        (1u8..=5, 1u8..=5, 1u8..=5, 1u8..=5),
        prop::collection::vec(0usize..64, 0..3),
        prop::option::weighted(0.4, 0usize..64),
    )
        .prop_map(|(points, scores, deps, parent)| Shape {
            points,
            scores,
            deps,
            parent,
        })
}

fn build(shapes: &[Shape]) -> Vec<WorkItem> {
    shapes
        .iter()
        .enumerate()
        .map(|(i, shape)| {
            let (bv, ui, c, r) = shape.scores;
            let mut item = WorkItem::new(format!("w{i}"), format!("Work {i}"), shape.points)
                .with_scores(bv, ui, c, r)
                .with_dependencies(
                    shape.deps
                        .iter()
                        .map(|d| format!("w{}", d % shapes.len()))
                        .filter(|id| *id != format!("w{i}")),
                );
            if let Some(p) = shape.parent.filter(|_| i > 0) {
                item = item.with_parent(format!("w{}", p % i));
            }
            item
        })
        .collect()
}

fn run(items: &[WorkItem], hours: f64) -> AllocationPlan {
    let team = vec![TeamMember::new("dev").with_hours(hours)];
    let context = ProjectContext::starting(NaiveDate::from_ymd_opt(2026, 1, 5).expect("date"));
    allocate(items, &team, &CapacityConfig::default(), &context).expect("valid input")
}

fn backlog() -> impl Strategy<Value = Vec<WorkItem>> {
    prop::collection::vec(shape_strategy(), 1..40).prop_map(|shapes| build(&shapes))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn points_are_conserved(items in backlog(), hours in 10.0f64..80.0) {
        let plan = run(&items, hours);
        let unscheduled: u64 = items
            .iter()
            .filter(|i| plan.unscheduled.contains(&i.id))
            .map(|i| u64::from(i.points))
            .sum();
        let total: u64 = items.iter().map(|i| u64::from(i.points)).sum();
        prop_assert_eq!(plan.scheduled_points() + unscheduled, total);
        if plan.iterations.len() < MAX_ITERATIONS {
            prop_assert!(plan.unscheduled.is_empty());
        }
    }

    #[test]
    fn every_item_is_placed_at_most_once(items in backlog(), hours in 10.0f64..80.0) {
        let plan = run(&items, hours);
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for it in &plan.iterations {
            for id in it.item_ids() {
                *seen.entry(id).or_default() += 1;
            }
        }
        prop_assert!(seen.values().all(|&n| n == 1));
        prop_assert_eq!(seen.len() + plan.unscheduled.len(), items.len());
    }

    #[test]
    fn capacity_is_respected_unless_forced(items in backlog(), hours in 10.0f64..80.0) {
        let plan = run(&items, hours);
        let capacity = plan.capacity.total_story_points;
        for it in &plan.iterations {
            if it.metrics.total_points > u64::from(capacity) {
                prop_assert_eq!(it.items.len(), 1);
            }
        }
    }

    #[test]
    fn children_follow_parents(items in backlog(), hours in 10.0f64..80.0) {
        let plan = run(&items, hours);
        if plan.strategy.strategy == packing::Strategy::DependencyAware {
            for item in &items {
                let Some(parent) = item.parent_id.as_deref() else { continue };
                if let (Some(child_at), Some(parent_at)) =
                    (plan.iteration_of(&item.id), plan.iteration_of(parent))
                {
                    prop_assert!(child_at >= parent_at, "{} before {}", item.id, parent);
                }
            }
        }
    }

    #[test]
    fn allocation_is_idempotent(items in backlog(), hours in 10.0f64..80.0) {
        let first = run(&items, hours);
        let second = run(&items, hours);
        prop_assert_eq!(&first.fingerprint, &second.fingerprint);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn risk_stays_in_range(items in backlog(), hours in 10.0f64..80.0) {
        let plan = run(&items, hours);
        for it in &plan.iterations {
            let risk = &it.risk_assessment;
            prop_assert!((0.0..=5.0).contains(&risk.overall));
            prop_assert!((0.1..=1.0).contains(&risk.confidence));
            prop_assert!(risk.factors.as_array().iter().all(|f| *f >= 0.0));
        }
    }

    #[test]
    fn dependency_score_matches_formula(n in 0usize..20) {
        #[allow(clippy::cast_precision_loss)]
        let expected = (3.0 - 0.5 * n as f64).clamp(1.0, 5.0);
        prop_assert!((dependency_score(n) - expected).abs() < 1e-12);
    }

    #[test]
    fn score_is_monotonic(
        bv in 1u8..5, ui in 1u8..=5, c in 1u8..=5, r in 1u8..=5,
    ) {
        let scorer = PriorityScorer::default();
        let base = scorer.score(&WorkItem::new("x", "X", 1).with_scores(bv, ui, c, r));
        let better = scorer.score(&WorkItem::new("x", "X", 1).with_scores(bv + 1, ui, c, r));
        prop_assert!(better.priority_score >= base.priority_score);

        if c < 5 {
            let harder = scorer.score(&WorkItem::new("x", "X", 1).with_scores(bv, ui, c + 1, r));
            prop_assert!(harder.priority_score <= base.priority_score);
        }
        if r < 5 {
            let riskier = scorer.score(&WorkItem::new("x", "X", 1).with_scores(bv, ui, c, r + 1));
            prop_assert!(riskier.priority_score <= base.priority_score);
        }
        if ui < 5 {
            let wider = scorer.score(&WorkItem::new("x", "X", 1).with_scores(bv, ui + 1, c, r));
            prop_assert!(wider.priority_score >= base.priority_score);
        }
    }
}
