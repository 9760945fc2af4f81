//! Input model for one allocation run.

pub mod item;
pub mod plan;
pub mod team;

pub use item::{PriorityTier, WorkItem};
pub use plan::{
    BacklogDocument, CapacityConfig, PriorityWeights, ProjectContext, RiskThresholds,
};
pub use team::TeamMember;
