use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Lowest value accepted on the 1–5 attribute scales.
pub const SCALE_MIN: u8 = 1;
/// Highest value accepted on the 1–5 attribute scales.
pub const SCALE_MAX: u8 = 5;

/// Priority bucket derived from the composite priority score.
///
/// Ordering follows scheduling precedence: `Critical` sorts highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Backlog,
    Low,
    Medium,
    High,
    Critical,
}

impl PriorityTier {
    /// All tiers, highest precedence first.
    pub const ALL: [Self; 5] = [
        Self::Critical,
        Self::High,
        Self::Medium,
        Self::Low,
        Self::Backlog,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Backlog => "backlog",
        }
    }

    /// Map a rounded priority score onto its tier.
    ///
    /// Thresholds: `>= 4.5` critical, `>= 3.5` high, `>= 2.5` medium,
    /// `>= 1.5` low, otherwise backlog.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 4.5 {
            Self::Critical
        } else if score >= 3.5 {
            Self::High
        } else if score >= 2.5 {
            Self::Medium
        } else if score >= 1.5 {
            Self::Low
        } else {
            Self::Backlog
        }
    }

    /// Critical and high tiers count as "urgent" for balance checks.
    #[must_use]
    pub const fn is_urgent(self) -> bool {
        matches!(self, Self::Critical | Self::High)
    }
}

impl fmt::Display for PriorityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a [`PriorityTier`] from text fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTierError(String);

impl fmt::Display for ParseTierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid priority tier '{}': expected critical, high, medium, low or backlog",
            self.0
        )
    }
}

impl std::error::Error for ParseTierError {}

impl FromStr for PriorityTier {
    type Err = ParseTierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "critical" => Ok(Self::Critical),
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            "backlog" => Ok(Self::Backlog),
            other => Err(ParseTierError(other.to_string())),
        }
    }
}

/// A schedulable unit of work as supplied by the caller.
///
/// Work items are immutable input for one allocation run. Children are not
/// stored here: they are always derived from `parent_id` back-references
/// when the backlog arena is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: String,
    pub title: String,
    /// Optional user-story text ("As a …, I want …, so that …").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Story point estimate.
    #[serde(default)]
    pub points: u32,
    #[serde(default = "default_scale")]
    pub business_value: u8,
    #[serde(default = "default_scale")]
    pub user_impact: u8,
    #[serde(default = "default_scale")]
    pub complexity: u8,
    #[serde(default = "default_scale")]
    pub risk: u8,
    /// Ids of items this item depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Explicit tier; derived from the priority score when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<PriorityTier>,
}

const fn default_scale() -> u8 {
    3
}

impl WorkItem {
    /// Create an item with neutral (3) attribute scores and no relations.
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, points: u32) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            points,
            business_value: default_scale(),
            user_impact: default_scale(),
            complexity: default_scale(),
            risk: default_scale(),
            dependencies: Vec::new(),
            parent_id: None,
            priority: None,
        }
    }

    #[must_use]
    pub fn with_scores(mut self, business_value: u8, user_impact: u8, complexity: u8, risk: u8) -> Self {
        self.business_value = business_value;
        self.user_impact = user_impact;
        self.complexity = complexity;
        self.risk = risk;
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub const fn with_priority(mut self, tier: PriorityTier) -> Self {
        self.priority = Some(tier);
        self
    }
}
