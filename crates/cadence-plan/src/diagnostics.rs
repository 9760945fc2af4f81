//! Non-fatal findings accumulated during an allocation run.
//!
//! Only input validation aborts a run. Cycles, oversized items, the
//! iteration cap and references to unknown items are collected here and
//! returned next to the iterations.

use std::fmt;

use serde::Serialize;

use crate::graph::CycleReport;

/// Which relation a cycle was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleVia {
    Dependencies,
    Parent,
}

/// A single diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// Items reference each other in a loop; allocation still proceeds.
    CycleDetected {
        via: CycleVia,
        members: Vec<String>,
        suggested_breaks: Vec<(String, String)>,
    },
    /// One item larger than a whole iteration was scheduled on its own.
    CapacityExceeded {
        sequence: u32,
        item_id: String,
        points: u32,
        capacity: u32,
    },
    /// The iteration cap was reached with items still unscheduled.
    IterationCap {
        limit: usize,
        unscheduled: Vec<String>,
    },
    /// Dependency or parent ids that are not part of this batch.
    UnknownReference { item_id: String, missing: Vec<String> },
}

impl Diagnostic {
    #[must_use]
    pub fn cycle(via: CycleVia, report: CycleReport) -> Self {
        Self::CycleDetected {
            via,
            members: report.members,
            suggested_breaks: report.suggested_breaks,
        }
    }

    /// Stable short name, matching the serialized `kind` tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CycleDetected { .. } => "cycle_detected",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::IterationCap { .. } => "iteration_cap",
            Self::UnknownReference { .. } => "unknown_reference",
        }
    }

    #[must_use]
    pub const fn is_cycle(&self) -> bool {
        matches!(self, Self::CycleDetected { .. })
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CycleDetected {
                via,
                members,
                suggested_breaks,
            } => {
                let relation = match via {
                    CycleVia::Dependencies => "dependency",
                    CycleVia::Parent => "parent",
                };
                write!(f, "{relation} cycle among {}", members.join(", "))?;
                if let Some((from, to)) = suggested_breaks.first() {
                    write!(f, " (break {from} -> {to})")?;
                }
                Ok(())
            }
            Self::CapacityExceeded {
                sequence,
                item_id,
                points,
                capacity,
            } => write!(
                f,
                "iteration {sequence}: {item_id} ({points} pts) exceeds capacity of {capacity} pts and was scheduled alone"
            ),
            Self::IterationCap { limit, unscheduled } => write!(
                f,
                "iteration cap of {limit} reached; {} item(s) left unscheduled",
                unscheduled.len()
            ),
            Self::UnknownReference { item_id, missing } => {
                write!(f, "{item_id} references unknown item(s): {}", missing.join(", "))
            }
        }
    }
}
