//! Input validation for an allocation run.
//!
//! Every check here is fatal: the engine refuses to start when any of them
//! fails. Softer conditions (cycles, unknown references, zero capacity) are
//! left to the engine, which reports them as diagnostics.

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::model::item::{SCALE_MAX, SCALE_MIN};
use crate::model::{CapacityConfig, TeamMember, WorkItem};

/// Longest accepted iteration, in days.
pub const MAX_ITERATION_LENGTH_DAYS: u32 = 365;

/// Validate the complete input of one allocation run.
///
/// # Errors
///
/// Returns the first [`ValidationError`] found, checking the backlog, then
/// the team, then the configuration.
pub fn validate_inputs(
    items: &[WorkItem],
    team: &[TeamMember],
    config: &CapacityConfig,
) -> Result<(), ValidationError> {
    validate_items(items)?;
    validate_team(team)?;
    validate_config(config)
}

/// Validate work items: non-empty batch, unique non-empty ids, scores on
/// the 1–5 scale.
///
/// # Errors
///
/// Returns the first offending item.
pub fn validate_items(items: &[WorkItem]) -> Result<(), ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyBacklog);
    }

    let mut seen: HashSet<&str> = HashSet::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if item.id.trim().is_empty() {
            return Err(ValidationError::EmptyItemId { index });
        }
        if !seen.insert(item.id.as_str()) {
            return Err(ValidationError::DuplicateItemId(item.id.clone()));
        }

        let scores = [
            ("business_value", item.business_value),
            ("user_impact", item.user_impact),
            ("complexity", item.complexity),
            ("risk", item.risk),
        ];
        for (field, value) in scores {
            if !(SCALE_MIN..=SCALE_MAX).contains(&value) {
                return Err(ValidationError::ScoreOutOfRange {
                    item_id: item.id.clone(),
                    field,
                    value,
                });
            }
        }
    }

    Ok(())
}

/// Validate team members.
///
/// # Errors
///
/// Returns [`ValidationError::EmptyTeam`] or the first member with unusable
/// hours.
pub fn validate_team(team: &[TeamMember]) -> Result<(), ValidationError> {
    if team.is_empty() {
        return Err(ValidationError::EmptyTeam);
    }

    for member in team {
        let hours = member.weekly_hours();
        if !hours.is_finite() || hours < 0.0 {
            return Err(ValidationError::InvalidHours {
                member_id: member.id.clone(),
                hours,
            });
        }
    }

    Ok(())
}

/// Validate capacity, weight and threshold configuration.
///
/// # Errors
///
/// Returns the first invalid setting.
pub fn validate_config(config: &CapacityConfig) -> Result<(), ValidationError> {
    if config.iteration_length_days == 0 {
        return Err(ValidationError::ZeroIterationLength);
    }
    if config.iteration_length_days > MAX_ITERATION_LENGTH_DAYS {
        return Err(ValidationError::IterationLengthTooLong {
            days: config.iteration_length_days,
            max: MAX_ITERATION_LENGTH_DAYS,
        });
    }

    let factor = config.velocity_buffer_factor;
    if !factor.is_finite() || factor <= 0.0 || factor > 1.0 {
        return Err(ValidationError::InvalidBufferFactor(factor));
    }

    let weights = &config.priority_weights;
    let named = [
        ("business_value", weights.business_value),
        ("user_impact", weights.user_impact),
        ("complexity", weights.complexity),
        ("risk", weights.risk),
        ("dependencies", weights.dependencies),
    ];
    for (name, value) in named {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::InvalidWeight { name, value });
        }
    }
    if weights.sum() <= 0.0 {
        return Err(ValidationError::ZeroWeights);
    }

    let t = &config.risk_thresholds;
    let finite = t.low.is_finite() && t.medium.is_finite() && t.high.is_finite();
    if !finite || t.low > t.medium || t.medium > t.high {
        return Err(ValidationError::InvalidRiskThresholds {
            low: t.low,
            medium: t.medium,
            high: t.high,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PriorityWeights, RiskThresholds};

    fn team() -> Vec<TeamMember> {
        vec![TeamMember::new("dev-1")]
    }

    #[test]
    fn accepts_minimal_valid_input() {
        let items = vec![WorkItem::new("W-1", "Login", 3)];
        assert!(validate_inputs(&items, &team(), &CapacityConfig::default()).is_ok());
    }

    #[test]
    fn rejects_empty_backlog() {
        let err = validate_inputs(&[], &team(), &CapacityConfig::default()).expect_err("should be rejected");
        assert_eq!(err, ValidationError::EmptyBacklog);
    }

    #[test]
    fn rejects_empty_team() {
        let items = vec![WorkItem::new("W-1", "Login", 3)];
        let err = validate_inputs(&items, &[], &CapacityConfig::default()).expect_err("should be rejected");
        assert_eq!(err, ValidationError::EmptyTeam);
    }

    #[test]
    fn rejects_duplicate_ids() {
        let items = vec![WorkItem::new("W-1", "A", 1), WorkItem::new("W-1", "B", 2)];
        let err = validate_items(&items).expect_err("should be rejected");
        assert_eq!(err, ValidationError::DuplicateItemId("W-1".to_string()));
    }

    #[test]
    fn rejects_blank_ids() {
        let items = vec![WorkItem::new("  ", "A", 1)];
        assert_eq!(
            validate_items(&items).expect_err("should be rejected"),
            ValidationError::EmptyItemId { index: 0 }
        );
    }

    #[test]
    fn rejects_scores_off_scale() {
        let items = vec![WorkItem::new("W-1", "A", 1).with_scores(6, 3, 3, 3)];
        assert!(matches!(
            validate_items(&items).expect_err("should be rejected"),
            ValidationError::ScoreOutOfRange {
                field: "business_value",
                value: 6,
                ..
            }
        ));

        let items = vec![WorkItem::new("W-1", "A", 1).with_scores(3, 3, 0, 3)];
        assert!(matches!(
            validate_items(&items).expect_err("should be rejected"),
            ValidationError::ScoreOutOfRange {
                field: "complexity",
                ..
            }
        ));
    }

    #[test]
    fn rejects_negative_hours() {
        let members = vec![TeamMember::new("dev-1").with_hours(-4.0)];
        assert!(matches!(
            validate_team(&members).expect_err("should be rejected"),
            ValidationError::InvalidHours { .. }
        ));
    }

    #[test]
    fn rejects_buffer_factor_outside_unit_interval() {
        for factor in [0.0, -0.5, 1.01, f64::NAN] {
            let config = CapacityConfig {
                velocity_buffer_factor: factor,
                ..CapacityConfig::default()
            };
            assert!(matches!(
                validate_config(&config).expect_err("should be rejected"),
                ValidationError::InvalidBufferFactor(_)
            ));
        }

        let config = CapacityConfig {
            velocity_buffer_factor: 1.0,
            ..CapacityConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_zero_iteration_length() {
        let config = CapacityConfig {
            iteration_length_days: 0,
            ..CapacityConfig::default()
        };
        assert_eq!(
            validate_config(&config).expect_err("should be rejected"),
            ValidationError::ZeroIterationLength
        );
    }

    #[test]
    fn rejects_iteration_length_beyond_a_year() {
        let config = CapacityConfig {
            iteration_length_days: u32::MAX,
            ..CapacityConfig::default()
        };
        let err = validate_config(&config).expect_err("should be rejected");
        assert_eq!(
            err,
            ValidationError::IterationLengthTooLong {
                days: u32::MAX,
                max: MAX_ITERATION_LENGTH_DAYS,
            }
        );
        assert_eq!(err.code().code(), "E1002");

        let config = CapacityConfig {
            iteration_length_days: MAX_ITERATION_LENGTH_DAYS,
            ..CapacityConfig::default()
        };
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_all_zero_weights() {
        let config = CapacityConfig {
            priority_weights: PriorityWeights {
                business_value: 0.0,
                user_impact: 0.0,
                complexity: 0.0,
                risk: 0.0,
                dependencies: 0.0,
            },
            ..CapacityConfig::default()
        };
        assert_eq!(validate_config(&config).expect_err("should be rejected"), ValidationError::ZeroWeights);
    }

    #[test]
    fn rejects_negative_weight() {
        let config = CapacityConfig {
            priority_weights: PriorityWeights {
                risk: -1.0,
                ..PriorityWeights::default()
            },
            ..CapacityConfig::default()
        };
        assert!(matches!(
            validate_config(&config).expect_err("should be rejected"),
            ValidationError::InvalidWeight { name: "risk", .. }
        ));
    }

    #[test]
    fn rejects_unordered_thresholds() {
        let config = CapacityConfig {
            risk_thresholds: RiskThresholds {
                low: 3.0,
                medium: 2.0,
                high: 5.0,
            },
            ..CapacityConfig::default()
        };
        assert!(matches!(
            validate_config(&config).expect_err("should be rejected"),
            ValidationError::InvalidRiskThresholds { .. }
        ));
    }
}
