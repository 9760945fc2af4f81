#![forbid(unsafe_code)]
//! cadence-plan library.
//!
//! Partitions a scored backlog into capacity-bounded iterations, then
//! attaches metrics, a five-factor risk score, mitigations,
//! recommendations and goal text to every iteration. The entry point is
//! [`engine::allocate`].
//!
//! # Conventions
//!
//! - **Errors**: only input validation is fatal
//!   ([`cadence_core::ValidationError`]); everything else is a
//!   [`diagnostics::Diagnostic`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod allocate;
pub mod calendar;
pub mod capacity;
pub mod diagnostics;
pub mod engine;
pub mod goal;
pub mod graph;
pub mod mitigation;
pub mod report;
pub mod risk;
pub mod score;

pub use diagnostics::{CycleVia, Diagnostic};
pub use engine::{AllocationPlan, Iteration, PlannedItem, allocate, allocate_with_goals, apply_goals};
pub use goal::{GoalRequest, GoalSource, GoalTextGenerator};
