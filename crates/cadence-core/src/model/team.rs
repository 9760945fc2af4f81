use serde::{Deserialize, Serialize};

/// Weekly hours assumed for a member who does not state availability.
pub const DEFAULT_WEEKLY_HOURS: f64 = 40.0;

/// A team member contributing capacity to every iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_available_hours: Option<f64>,
}

impl TeamMember {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            weekly_available_hours: None,
        }
    }

    #[must_use]
    pub const fn with_hours(mut self, hours: f64) -> Self {
        self.weekly_available_hours = Some(hours);
        self
    }

    /// Weekly availability, defaulting to a 40-hour week.
    #[must_use]
    pub fn weekly_hours(&self) -> f64 {
        self.weekly_available_hours.unwrap_or(DEFAULT_WEEKLY_HOURS)
    }
}
