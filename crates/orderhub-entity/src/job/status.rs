//! Job status, priority and type enumerations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a notification job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Waiting for a worker, possibly with a future `scheduled_at`.
    Pending,
    /// Claimed by exactly one worker.
    Active,
    /// Handler finished (sent or deliberately skipped).
    Completed,
    /// Attempts exhausted or permanently rejected; retained until retried or cleaned.
    Failed,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority level for a notification job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    /// Low priority (processed last).
    Low,
    /// Normal priority (default).
    #[default]
    Normal,
    /// High priority.
    High,
    /// Critical priority (processed first).
    Critical,
}

impl JobPriority {
    /// Return the numeric priority (higher = more urgent).
    pub fn numeric_priority(&self) -> u8 {
        match self {
            Self::Low => 1,
            Self::Normal => 2,
            Self::High => 3,
            Self::Critical => 4,
        }
    }

    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for JobPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Known notification job types.
///
/// Jobs carry their type as a plain string so that a producer can enqueue a
/// type this build does not know; such jobs fail permanently at execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Alert about a freshly placed order.
    NewOrder,
    /// Alert about an order status transition.
    StatusChange,
    /// Pre-rendered message sent verbatim.
    Custom,
    /// Campaign message with optional media.
    Broadcast,
}

impl JobType {
    /// Wire name of the job type.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewOrder => "new_order",
            Self::StatusChange => "status_change",
            Self::Custom => "custom",
            Self::Broadcast => "broadcast",
        }
    }

    /// Parse a wire name; `None` for types this build does not handle.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new_order" => Some(Self::NewOrder),
            "status_change" => Some(Self::StatusChange),
            "custom" => Some(Self::Custom),
            "broadcast" => Some(Self::Broadcast),
            _ => None,
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_type_parse() {
        assert_eq!(JobType::parse("new_order"), Some(JobType::NewOrder));
        assert_eq!(JobType::parse("broadcast"), Some(JobType::Broadcast));
        assert_eq!(JobType::parse("fax"), None);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(JobPriority::Critical.numeric_priority() > JobPriority::High.numeric_priority());
        assert!(JobPriority::Normal.numeric_priority() > JobPriority::Low.numeric_priority());
        assert_eq!(JobPriority::default(), JobPriority::Normal);
    }
}
