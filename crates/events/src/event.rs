use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use naslet_core::{DomainError, DomainResult, Entity, EventId, UserId};

use crate::User;

const MAX_NAME_LEN: usize = 255;
const MAX_DESCRIPTION_LEN: usize = 4000;
const MAX_LOCATION_LEN: usize = 255;

/// The creator-editable part of an event.
///
/// Shared by creation and full updates; both go through [`EventDetails::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDetails {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
    /// Price in minor currency units; `None` means free.
    #[serde(default)]
    pub price: Option<i64>,
}

impl EventDetails {
    /// Validate and normalize (trims the name).
    pub fn validate(mut self) -> DomainResult<Self> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("event name cannot be empty"));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(DomainError::validation(format!(
                "event name cannot exceed {MAX_NAME_LEN} characters"
            )));
        }
        self.name = name.to_string();

        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(DomainError::validation(format!(
                    "event description cannot exceed {MAX_DESCRIPTION_LEN} characters"
                )));
            }
        }
        if let Some(location) = &self.location {
            if location.chars().count() > MAX_LOCATION_LEN {
                return Err(DomainError::validation(format!(
                    "event location cannot exceed {MAX_LOCATION_LEN} characters"
                )));
            }
        }
        if matches!(self.price, Some(p) if p < 0) {
            return Err(DomainError::validation("event price cannot be negative"));
        }

        Ok(self)
    }
}

/// An event owned by exactly one creator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub creator_id: UserId,
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub location: Option<String>,
    pub price: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// Build a new event owned by `creator`. Details are validated first.
    pub fn create(
        creator: &User,
        details: EventDetails,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let details = details.validate()?;
        Ok(Self {
            id: EventId::new(),
            creator_id: creator.id,
            name: details.name,
            description: details.description,
            date: details.date,
            location: details.location,
            price: details.price,
            created_at,
        })
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        self.creator_id == user.id
    }

    /// Overwrite every mutable field. Identity, creator and creation time stay.
    pub fn apply_details(&mut self, details: EventDetails) -> DomainResult<()> {
        let details = details.validate()?;
        self.name = details.name;
        self.description = details.description;
        self.date = details.date;
        self.location = details.location;
        self.price = details.price;
        Ok(())
    }
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id
    }
}
