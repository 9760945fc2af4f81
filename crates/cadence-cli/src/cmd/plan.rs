//! `cadence plan`: allocate a backlog document into iterations.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use cadence_core::config::resolve_config;
use cadence_core::model::{BacklogDocument, CapacityConfig};
use cadence_core::ErrorCode;
use cadence_plan::{AllocationPlan, GoalSource, Iteration, allocate, allocate_with_goals};
use chrono::NaiveDate;
use clap::Args;
use tracing::{debug, info};

use crate::goal_command::CommandGoalGenerator;
use crate::output::{
    CliError, OutputMode, pretty_kv, pretty_rule, pretty_section, render_error, render_mode,
};

/// Arguments for `cadence plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Backlog document (JSON) with project, team and items.
    pub backlog: PathBuf,

    /// Override the iteration length in days.
    #[arg(long, value_name = "DAYS")]
    pub iteration_days: Option<u32>,

    /// Override the velocity buffer factor, in (0, 1].
    #[arg(long, value_name = "FACTOR")]
    pub buffer: Option<f64>,

    /// Override the project start date (YYYY-MM-DD).
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<NaiveDate>,

    /// External program that writes goal text; overrides `goals.command`.
    #[arg(long, value_name = "COMMAND")]
    pub goal_command: Option<String>,

    /// Seconds to wait for the goal program per iteration; overrides `goals.timeout_secs`.
    #[arg(long, value_name = "SECS")]
    pub goal_timeout: Option<u64>,

    /// Always use the built-in goal summary, even if a goal command is configured.
    #[arg(long, conflicts_with = "goal_command")]
    pub no_goal_command: bool,
}

/// Execute `cadence plan`.
pub fn run_plan(
    args: &PlanArgs,
    config_path: Option<&Path>,
    output: OutputMode,
    project_root: &Path,
) -> anyhow::Result<()> {
    let effective = match resolve_config(project_root, config_path) {
        Ok(effective) => effective,
        Err(e) => {
            let msg = format!("{e:#}");
            render_error(output, &CliError::coded(ErrorCode::ConfigParseError, &msg))?;
            anyhow::bail!("{msg}");
        }
    };
    debug!(source = ?effective.source, "resolved config");

    let document = match BacklogDocument::load(&args.backlog) {
        Ok(document) => document,
        Err(e) => {
            let msg = format!("{e:#}");
            render_error(output, &CliError::new(&msg))?;
            anyhow::bail!("{msg}");
        }
    };

    let mut capacity_config = effective.config.capacity_config();
    apply_overrides(&mut capacity_config, args);

    let mut context = document.project.clone();
    if let Some(start) = args.start_date {
        context.start_date = start;
    }

    let goal_command = if args.no_goal_command {
        None
    } else {
        args.goal_command
            .as_deref()
            .or(effective.config.goals.command.as_deref())
            .and_then(CommandGoalGenerator::parse)
    };

    let result = match goal_command {
        Some(generator) => {
            let timeout = Duration::from_secs(
                args.goal_timeout
                    .unwrap_or(effective.config.goals.timeout_secs),
            );
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("start async runtime")?;
            runtime.block_on(allocate_with_goals(
                &document.items,
                &document.team,
                &capacity_config,
                &context,
                &generator,
                timeout,
            ))
        }
        None => allocate(&document.items, &document.team, &capacity_config, &context),
    };

    let plan = match result {
        Ok(plan) => plan,
        Err(e) => {
            render_error(output, &CliError::from(&e))?;
            anyhow::bail!("{e}");
        }
    };

    info!(
        iterations = plan.iterations.len(),
        fingerprint = %plan.fingerprint,
        "plan ready"
    );

    render_mode(output, &plan, render_plan_text, render_plan_pretty)
}

fn apply_overrides(config: &mut CapacityConfig, args: &PlanArgs) {
    if let Some(days) = args.iteration_days {
        config.iteration_length_days = days;
    }
    if let Some(buffer) = args.buffer {
        config.velocity_buffer_factor = buffer;
    }
}

fn goal_marker(iteration: &Iteration) -> &'static str {
    match iteration.goal_source {
        GoalSource::Generated => "",
        GoalSource::Fallback => " (fallback)",
    }
}

fn format_utilization(percent: f64) -> String {
    if percent.is_finite() {
        format!("{percent:.1}%")
    } else {
        "n/a".to_string()
    }
}

fn render_plan_text(plan: &AllocationPlan, w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{}", plan.strategy.explain())?;
    writeln!(
        w,
        "capacity {} pts/iteration ({:.1} h, buffer {:.2})",
        plan.capacity.total_story_points,
        plan.capacity.total_hours,
        plan.capacity.velocity_buffer_factor
    )?;

    for iteration in &plan.iterations {
        writeln!(
            w,
            "iteration {} {}..{} points {}/{} risk {} ({:.2})",
            iteration.sequence,
            iteration.start_date,
            iteration.end_date,
            iteration.metrics.total_points,
            iteration.metrics.capacity_points,
            iteration.risk_assessment.level,
            iteration.risk_assessment.overall,
        )?;
        writeln!(w, "  goal: {}", iteration.goal_text)?;
        for item in &iteration.items {
            writeln!(w, "  {} {}pts {} {}", item.id, item.points, item.tier, item.title)?;
        }
    }

    if !plan.unscheduled.is_empty() {
        writeln!(w, "unscheduled: {}", plan.unscheduled.join(" "))?;
    }
    for diagnostic in &plan.diagnostics {
        writeln!(w, "warning: {diagnostic}")?;
    }
    writeln!(w, "fingerprint {}", plan.fingerprint)
}

fn render_plan_pretty(plan: &AllocationPlan, w: &mut dyn Write) -> io::Result<()> {
    let title = plan
        .project_name
        .as_deref()
        .map_or_else(|| "Allocation plan".to_string(), |name| format!("Allocation plan: {name}"));
    pretty_section(w, &title)?;
    pretty_kv(w, "Strategy", plan.strategy.explain())?;
    pretty_kv(
        w,
        "Capacity",
        format!(
            "{} pts per iteration ({:.1} h, buffer {:.2})",
            plan.capacity.total_story_points,
            plan.capacity.total_hours,
            plan.capacity.velocity_buffer_factor
        ),
    )?;
    pretty_kv(w, "Iterations", plan.iterations.len().to_string())?;
    pretty_kv(w, "Scheduled", format!("{} pts", plan.scheduled_points()))?;

    for iteration in &plan.iterations {
        writeln!(w)?;
        pretty_section(
            w,
            &format!(
                "Iteration {}  {} to {}",
                iteration.sequence, iteration.start_date, iteration.end_date
            ),
        )?;
        pretty_kv(
            w,
            "Goal",
            format!("{}{}", iteration.goal_text, goal_marker(iteration)),
        )?;
        pretty_kv(
            w,
            "Load",
            format!(
                "{}/{} pts ({}){}",
                iteration.metrics.total_points,
                iteration.metrics.capacity_points,
                format_utilization(iteration.metrics.point_utilization),
                if iteration.metrics.is_over_capacity {
                    ", over capacity"
                } else {
                    ""
                }
            ),
        )?;
        pretty_kv(
            w,
            "Risk",
            format!(
                "{} ({:.2}, confidence {:.0}%)",
                iteration.risk_assessment.level,
                iteration.risk_assessment.overall,
                iteration.risk_assessment.confidence * 100.0
            ),
        )?;

        writeln!(w)?;
        for item in &iteration.items {
            writeln!(
                w,
                "  {:<12} {:>3} pts  {:<8}  {}",
                item.id,
                item.points,
                item.tier.as_str(),
                item.title
            )?;
        }

        if !iteration.mitigations.is_empty() {
            writeln!(w)?;
            writeln!(w, "  Mitigations")?;
            for mitigation in &iteration.mitigations {
                writeln!(w, "  - [{}] {}", mitigation.severity, mitigation.action)?;
            }
        }
        if !iteration.recommendations.is_empty() {
            writeln!(w)?;
            writeln!(w, "  Recommendations")?;
            for recommendation in &iteration.recommendations {
                writeln!(w, "  - {}", recommendation.message)?;
            }
        }
    }

    if !plan.unscheduled.is_empty() || !plan.diagnostics.is_empty() {
        writeln!(w)?;
        pretty_section(w, "Warnings")?;
        if !plan.unscheduled.is_empty() {
            writeln!(w, "  unscheduled: {}", plan.unscheduled.join(", "))?;
        }
        for diagnostic in &plan.diagnostics {
            writeln!(w, "  {diagnostic}")?;
        }
    }

    writeln!(w)?;
    pretty_rule(w)?;
    pretty_kv(w, "Fingerprint", &plan.fingerprint)
}
