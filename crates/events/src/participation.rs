use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use naslet_core::{DomainError, EventId, UserId};

/// Participation status lifecycle (attendance + payment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    #[default]
    Pending,
    Approved,
    Paid,
    Rejected,
}

impl ParticipationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParticipationStatus::Pending => "pending",
            ParticipationStatus::Approved => "approved",
            ParticipationStatus::Paid => "paid",
            ParticipationStatus::Rejected => "rejected",
        }
    }
}

impl core::fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipationStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "paid" => Ok(Self::Paid),
            "rejected" => Ok(Self::Rejected),
            other => Err(DomainError::validation(format!(
                "unknown participation status '{other}'"
            ))),
        }
    }
}

/// A user's participation in an event. Keyed by `(user_id, event_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    pub user_id: UserId,
    pub event_id: EventId,
    pub status: ParticipationStatus,
    pub joined_at: DateTime<Utc>,
}

impl Participation {
    pub fn new(user_id: UserId, event_id: EventId, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            event_id,
            status: ParticipationStatus::default(),
            joined_at,
        }
    }
}
