//! Allocation entry points.
//!
//! [`allocate`] is the synchronous, pure pipeline:
//!
//! ```text
//! validate → score + graph analysis → capacity → pack → per iteration:
//!     dates, metrics, risk, mitigations, recommendations, fallback goal
//! ```
//!
//! [`allocate_with_goals`] runs the same pipeline and then replaces each
//! fallback goal with text from an external [`GoalTextGenerator`] where
//! that succeeds within the timeout.

use std::fmt::Write as _;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};

use cadence_core::ValidationError;
use cadence_core::model::{
    CapacityConfig, PriorityTier, ProjectContext, TeamMember, WorkItem,
};
use cadence_core::validate::validate_inputs;

use crate::allocate::{self, StrategyReport};
use crate::calendar::iteration_window;
use crate::capacity::{self, CapacityProfile};
use crate::diagnostics::Diagnostic;
use crate::goal::{
    GoalItem, GoalRequest, GoalSource, GoalTextGenerator, fallback_goal_text, generate_goal,
};
use crate::graph::{Backlog, DependencyNode, GraphAnalysis, ScoredItem};
use crate::mitigation::{self, Mitigation};
use crate::report::{self, IterationMetrics, Recommendation};
use crate::risk::{self, RiskAssessment};
use crate::score::PriorityScorer;

/// A work item as placed in an iteration, with its computed scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedItem {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub points: u32,
    pub tier: PriorityTier,
    pub priority_score: f64,
    pub dependency_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
}

impl From<&ScoredItem> for PlannedItem {
    fn from(scored: &ScoredItem) -> Self {
        let item = &scored.item;
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            description: item.description.clone(),
            points: item.points,
            tier: scored.score.tier,
            priority_score: scored.score.priority_score,
            dependency_score: scored.score.dependency_score,
            parent_id: item.parent_id.clone(),
            dependencies: item.dependencies.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Iteration {
    /// 1-based.
    pub sequence: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// In placement order.
    pub items: Vec<PlannedItem>,
    pub metrics: IterationMetrics,
    pub risk_assessment: RiskAssessment,
    pub mitigations: Vec<Mitigation>,
    pub recommendations: Vec<Recommendation>,
    pub goal_text: String,
    pub goal_source: GoalSource,
}

impl Iteration {
    /// The request a goal generator receives for this iteration.
    #[must_use]
    pub fn goal_request(&self, project_name: Option<&str>) -> GoalRequest {
        GoalRequest {
            sequence: self.sequence,
            project_name: project_name.map(str::to_string),
            start_date: self.start_date,
            end_date: self.end_date,
            items: self
                .items
                .iter()
                .map(|item| GoalItem {
                    id: item.id.clone(),
                    title: item.title.clone(),
                    description: item.description.clone(),
                    points: item.points,
                    tier: item.tier,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn item_ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.id.as_str()).collect()
    }
}

/// Output of one allocation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    pub strategy: StrategyReport,
    pub capacity: CapacityProfile,
    pub iterations: Vec<Iteration>,
    /// Items left over after the iteration cap, in schedule order.
    pub unscheduled: Vec<String>,
    /// Families whose members ended up in different iterations.
    pub split_families: Vec<Vec<String>>,
    /// Resolved dependencies and dependents per item, in input order.
    pub dependency_graph: Vec<DependencyNode>,
    pub diagnostics: Vec<Diagnostic>,
    /// `blake3:<hex>` over the partitioning and risk scores.
    pub fingerprint: String,
}

impl AllocationPlan {
    #[must_use]
    pub fn scheduled_points(&self) -> u64 {
        self.iterations.iter().map(|it| it.metrics.total_points).sum()
    }

    #[must_use]
    pub fn iteration_of(&self, item_id: &str) -> Option<u32> {
        self.iterations
            .iter()
            .find(|it| it.items.iter().any(|item| item.id == item_id))
            .map(|it| it.sequence)
    }

    #[must_use]
    pub fn has_cycles(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_cycle)
    }
}

/// Partition `items` into iterations for `team` under `config`.
///
/// Goal text is always the deterministic fallback; see
/// [`allocate_with_goals`] for external generation.
///
/// # Errors
///
/// Returns [`ValidationError`] for empty or malformed input. Every other
/// condition (cycles, oversized items, the iteration cap) is reported in
/// [`AllocationPlan::diagnostics`].
#[instrument(skip_all, fields(items = items.len(), team = team.len()))]
pub fn allocate(
    items: &[WorkItem],
    team: &[TeamMember],
    config: &CapacityConfig,
    context: &ProjectContext,
) -> Result<AllocationPlan, ValidationError> {
    validate_inputs(items, team, config)?;

    let scorer = PriorityScorer::new(&config.priority_weights);
    let analysis = GraphAnalysis::analyze(items, &scorer);
    let backlog = &analysis.backlog;

    let capacity = capacity::calculate(team, config);
    let packed = allocate::allocate(backlog, capacity.total_story_points);

    let mut placement: Vec<Option<usize>> = vec![None; backlog.len()];
    for (index, bin) in packed.iterations.iter().enumerate() {
        for &idx in &bin.items {
            placement[idx] = Some(index);
        }
    }

    let iterations: Vec<Iteration> = (0u32..)
        .zip(&packed.iterations)
        .map(|(index, bin)| {
            build_iteration(
                backlog,
                &bin.items,
                index,
                &placement,
                &capacity,
                config,
                context,
            )
        })
        .collect();

    let mut diagnostics = analysis.diagnostics;
    diagnostics.extend(packed.diagnostics);

    let unscheduled: Vec<String> = packed
        .unscheduled
        .iter()
        .map(|&idx| backlog.get(idx).id().to_string())
        .collect();
    let split_families = report::split_families(backlog, &analysis.families, &placement);
    let fingerprint = fingerprint(&iterations, &unscheduled);

    info!(
        iterations = iterations.len(),
        unscheduled = unscheduled.len(),
        diagnostics = diagnostics.len(),
        %fingerprint,
        "allocation complete"
    );

    Ok(AllocationPlan {
        project_name: context.name.clone(),
        strategy: packed.strategy,
        capacity,
        iterations,
        unscheduled,
        split_families,
        dependency_graph: analysis.dependencies.nodes(),
        diagnostics,
        fingerprint,
    })
}

/// [`allocate`], then ask `generator` for each iteration's goal text.
///
/// Each call is bounded by `timeout`; a failed, unusable or late answer
/// keeps the fallback text and is only logged.
///
/// # Errors
///
/// Same as [`allocate`]; goal generation never fails the run.
pub async fn allocate_with_goals(
    items: &[WorkItem],
    team: &[TeamMember],
    config: &CapacityConfig,
    context: &ProjectContext,
    generator: &dyn GoalTextGenerator,
    timeout: Duration,
) -> Result<AllocationPlan, ValidationError> {
    let mut plan = allocate(items, team, config, context)?;
    apply_goals(&mut plan, generator, timeout).await;
    Ok(plan)
}

/// Replace fallback goal text with generated text where possible.
///
/// Iterations are processed in order; one iteration's failure does not
/// affect the others.
pub async fn apply_goals(
    plan: &mut AllocationPlan,
    generator: &dyn GoalTextGenerator,
    timeout: Duration,
) {
    let project_name = plan.project_name.clone();
    for iteration in &mut plan.iterations {
        let request = iteration.goal_request(project_name.as_deref());
        match generate_goal(generator, &request, timeout).await {
            Ok(text) => {
                iteration.goal_text = text;
                iteration.goal_source = GoalSource::Generated;
            }
            Err(err) => {
                warn!(
                    sequence = iteration.sequence,
                    error = %err,
                    "goal generation failed, keeping fallback text"
                );
            }
        }
    }
}

fn build_iteration(
    backlog: &Backlog,
    members: &[usize],
    index: u32,
    placement: &[Option<usize>],
    capacity: &CapacityProfile,
    config: &CapacityConfig,
    context: &ProjectContext,
) -> Iteration {
    let (start_date, end_date) =
        iteration_window(context.start_date, index, config.iteration_length_days);

    let metrics = IterationMetrics::compute(backlog, members, capacity);
    let risk_assessment = risk::assess(
        backlog,
        members,
        index,
        capacity.total_story_points,
        &config.risk_thresholds,
    );
    let mitigations = mitigation::advise(backlog, members, &risk_assessment);
    let recommendations = report::recommendations(
        backlog,
        members,
        index as usize,
        placement,
        &metrics,
        &risk_assessment,
    );

    let mut iteration = Iteration {
        sequence: index + 1,
        start_date,
        end_date,
        items: members
            .iter()
            .map(|&idx| PlannedItem::from(backlog.get(idx)))
            .collect(),
        metrics,
        risk_assessment,
        mitigations,
        recommendations,
        goal_text: String::new(),
        goal_source: GoalSource::Fallback,
    };
    iteration.goal_text = fallback_goal_text(&iteration.goal_request(context.name.as_deref()));
    iteration
}

fn fingerprint(iterations: &[Iteration], unscheduled: &[String]) -> String {
    let mut canonical = String::new();
    for it in iterations {
        let _ = writeln!(
            canonical,
            "{}|{}|{:.6}",
            it.sequence,
            it.item_ids().join(","),
            it.risk_assessment.overall
        );
    }
    let _ = writeln!(canonical, "unscheduled|{}", unscheduled.join(","));
    format!("blake3:{}", blake3::hash(canonical.as_bytes()).to_hex())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team_of_ten_points() -> Vec<TeamMember> {
        // 50h over two weeks at 0.8 buffer: floor(50 * 2 / 8 * 0.8) = 10.
        vec![TeamMember::new("dev").with_hours(50.0)]
    }

    fn context() -> ProjectContext {
        ProjectContext::starting(NaiveDate::from_ymd_opt(2026, 1, 5).expect("valid date"))
    }

    #[test]
    fn empty_backlog_is_rejected() {
        let err = allocate(&[], &team_of_ten_points(), &CapacityConfig::default(), &context())
            .expect_err("empty backlog");
        assert_eq!(err, ValidationError::EmptyBacklog);
    }

    #[test]
    fn builds_dated_iterations() {
        let items = vec![
            WorkItem::new("a", "Alpha", 8),
            WorkItem::new("b", "Beta", 5),
        ];
        let plan = allocate(
            &items,
            &team_of_ten_points(),
            &CapacityConfig::default(),
            &context(),
        )
        .expect("valid input");

        assert_eq!(plan.capacity.total_story_points, 10);
        assert_eq!(plan.iterations.len(), 2);

        let first = &plan.iterations[0];
        assert_eq!(first.sequence, 1);
        assert_eq!(first.start_date, context().start_date);
        // 14 business days: Jan 5 .. Jan 22.
        assert_eq!(first.end_date, NaiveDate::from_ymd_opt(2026, 1, 22).expect("date"));
        assert_eq!(first.goal_text, "Iteration 1: deliver alpha");
        assert_eq!(first.goal_source, GoalSource::Fallback);

        let second = &plan.iterations[1];
        assert_eq!(second.start_date, NaiveDate::from_ymd_opt(2026, 1, 23).expect("date"));
        assert!((second.risk_assessment.factors.velocity - 0.1).abs() < 1e-9);
        assert_eq!(plan.scheduled_points(), 13);
        assert_eq!(plan.iteration_of("b"), Some(2));
    }

    #[test]
    fn plan_carries_resolved_dependency_graph() {
        let items = vec![
            WorkItem::new("api", "API", 3),
            WorkItem::new("ui", "UI", 3).with_dependencies(["api", "design-system"]),
        ];
        let plan = allocate(
            &items,
            &team_of_ten_points(),
            &CapacityConfig::default(),
            &context(),
        )
        .expect("valid input");

        let nodes = &plan.dependency_graph;
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].item_id, "api");
        assert_eq!(nodes[0].dependents, vec!["ui".to_string()]);
        assert_eq!(nodes[1].item_id, "ui");
        // Ids outside the batch stay out of the graph.
        assert_eq!(nodes[1].dependencies, vec!["api".to_string()]);
        assert!(nodes[1].dependents.is_empty());
    }

    #[test]
    fn fingerprint_is_stable_across_runs() {
        let items = vec![
            WorkItem::new("a", "Alpha", 3).with_dependencies(["b"]),
            WorkItem::new("b", "Beta", 3),
        ];
        let run = || {
            allocate(
                &items,
                &team_of_ten_points(),
                &CapacityConfig::default(),
                &context(),
            )
            .expect("valid input")
        };
        let first = run();
        assert!(first.fingerprint.starts_with("blake3:"));
        assert_eq!(first, run());
    }
}
