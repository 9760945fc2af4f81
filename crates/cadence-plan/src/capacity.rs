//! Team availability → per-iteration point and hour budgets.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use cadence_core::model::{CapacityConfig, TeamMember};
use serde::Serialize;
use tracing::{debug, instrument};

/// Fixed conversion between effort hours and story points.
pub const HOURS_PER_POINT: f64 = 8.0;

/// Absorbs float noise such as `9.999999999999998` before flooring.
const FLOOR_EPSILON: f64 = 1e-9;

/// One member's contribution to an iteration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberCapacity {
    pub member_id: String,
    pub hours: f64,
    pub story_points: u32,
}

/// Per-iteration budget derived from team availability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityProfile {
    /// Buffered story points per iteration (sum of per-member floors).
    pub total_story_points: u32,
    /// Unbuffered hours per iteration; used for hour utilization only.
    pub total_hours: f64,
    pub velocity_buffer_factor: f64,
    pub members: Vec<MemberCapacity>,
}

impl CapacityProfile {
    /// A profile with a fixed point budget and matching unbuffered hours.
    ///
    /// Useful when the caller already knows the team's velocity.
    #[must_use]
    pub fn fixed(story_points: u32) -> Self {
        Self {
            total_story_points: story_points,
            total_hours: f64::from(story_points) * HOURS_PER_POINT,
            velocity_buffer_factor: 1.0,
            members: Vec::new(),
        }
    }
}

/// Compute the per-iteration capacity of `team` under `config`.
///
/// `weeks = iteration_length_days / 7`; per member
/// `points = floor((weekly_hours * weeks / 8) * buffer)`, and
/// `total_hours = Σ weekly_hours * weeks` without the buffer.
#[must_use]
#[instrument(skip(team, config), fields(members = team.len()))]
pub fn calculate(team: &[TeamMember], config: &CapacityConfig) -> CapacityProfile {
    let weeks = f64::from(config.iteration_length_days) / 7.0;
    let buffer = config.velocity_buffer_factor;

    let members: Vec<MemberCapacity> = team
        .iter()
        .map(|member| {
            let hours = member.weekly_hours() * weeks;
            let raw_points = (hours / HOURS_PER_POINT) * buffer;
            MemberCapacity {
                member_id: member.id.clone(),
                hours,
                story_points: floor_points(raw_points),
            }
        })
        .collect();

    let total_story_points = members
        .iter()
        .fold(0u32, |acc, m| acc.saturating_add(m.story_points));
    let total_hours = members.iter().map(|m| m.hours).sum();

    debug!(total_story_points, total_hours, "capacity calculated");

    CapacityProfile {
        total_story_points,
        total_hours,
        velocity_buffer_factor: buffer,
        members,
    }
}

/// `used / available` as a percentage.
///
/// Zero availability yields `0` when nothing is used and `+inf` otherwise,
/// so any work against an empty budget reads as over capacity.
#[must_use]
pub fn utilization_percent(used: f64, available: f64) -> f64 {
    if available > 0.0 {
        used / available * 100.0
    } else if used > 0.0 {
        f64::INFINITY
    } else {
        0.0
    }
}

fn floor_points(raw: f64) -> u32 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    (raw + FLOOR_EPSILON).floor().min(f64::from(u32::MAX)) as u32
}
