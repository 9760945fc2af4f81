pub mod priority;

pub use priority::{ItemScore, PriorityScorer, backlog_order, dependency_score, schedule_order};
