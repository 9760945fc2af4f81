use std::fmt;

/// Machine-readable error codes for agent-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidCapacityConfig,
    InvalidWeights,
    InvalidRiskThresholds,
    EmptyBacklog,
    EmptyTeam,
    DuplicateItemId,
    InvalidItem,
    InvalidTeamMember,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidCapacityConfig => "E1002",
            Self::InvalidWeights => "E1003",
            Self::InvalidRiskThresholds => "E1004",
            Self::EmptyBacklog => "E2001",
            Self::EmptyTeam => "E2002",
            Self::DuplicateItemId => "E2003",
            Self::InvalidItem => "E2004",
            Self::InvalidTeamMember => "E2005",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::InvalidCapacityConfig => "Invalid capacity configuration",
            Self::InvalidWeights => "Invalid priority weights",
            Self::InvalidRiskThresholds => "Invalid risk thresholds",
            Self::EmptyBacklog => "Backlog is empty",
            Self::EmptyTeam => "Team is empty",
            Self::DuplicateItemId => "Duplicate work item ID",
            Self::InvalidItem => "Invalid work item",
            Self::InvalidTeamMember => "Invalid team member",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators and agents.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in .cadence/config.toml and retry."),
            Self::InvalidCapacityConfig => Some(
                "Use 1 <= iteration_length_days <= 365 and 0 < velocity_buffer_factor <= 1.",
            ),
            Self::InvalidWeights => {
                Some("Use non-negative weights with at least one weight above zero.")
            }
            Self::InvalidRiskThresholds => Some("Thresholds must satisfy low <= medium <= high."),
            Self::EmptyBacklog => Some("Add at least one work item to the backlog."),
            Self::EmptyTeam => Some("Add at least one team member."),
            Self::DuplicateItemId => Some("Give every work item a unique id."),
            Self::InvalidItem => Some("Item ids must be non-empty and scores within 1..=5."),
            Self::InvalidTeamMember => {
                Some("Weekly available hours must be a finite, non-negative number.")
            }
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Fatal input problems detected before any computation starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("backlog contains no work items")]
    EmptyBacklog,

    #[error("team contains no members")]
    EmptyTeam,

    #[error("work item at position {index} has an empty id")]
    EmptyItemId { index: usize },

    #[error("duplicate work item id '{0}'")]
    DuplicateItemId(String),

    #[error("work item '{item_id}': {field} = {value} is outside 1..=5")]
    ScoreOutOfRange {
        item_id: String,
        field: &'static str,
        value: u8,
    },

    #[error("team member '{member_id}': weekly hours {hours} must be finite and >= 0")]
    InvalidHours { member_id: String, hours: f64 },

    #[error("iteration length must be at least one day")]
    ZeroIterationLength,

    #[error("iteration length {days} days exceeds the maximum of {max}")]
    IterationLengthTooLong { days: u32, max: u32 },

    #[error("velocity buffer factor {0} must be in (0, 1]")]
    InvalidBufferFactor(f64),

    #[error("priority weight '{name}' = {value} must be finite and >= 0")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("priority weights must not all be zero")]
    ZeroWeights,

    #[error("risk thresholds must be finite and ordered low <= medium <= high (got {low}, {medium}, {high})")]
    InvalidRiskThresholds { low: f64, medium: f64, high: f64 },
}

impl ValidationError {
    /// Stable error code for this validation failure.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::EmptyBacklog => ErrorCode::EmptyBacklog,
            Self::EmptyTeam => ErrorCode::EmptyTeam,
            Self::DuplicateItemId(_) => ErrorCode::DuplicateItemId,
            Self::EmptyItemId { .. } | Self::ScoreOutOfRange { .. } => ErrorCode::InvalidItem,
            Self::InvalidHours { .. } => ErrorCode::InvalidTeamMember,
            Self::ZeroIterationLength
            | Self::IterationLengthTooLong { .. }
            | Self::InvalidBufferFactor(_) => {
                ErrorCode::InvalidCapacityConfig
            }
            Self::InvalidWeight { .. } | Self::ZeroWeights => ErrorCode::InvalidWeights,
            Self::InvalidRiskThresholds { .. } => ErrorCode::InvalidRiskThresholds,
        }
    }
}
