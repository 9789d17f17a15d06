//! Shared data models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// Lifecycle state of a slot.
///
/// Wire values match the participant status reported by room-event callbacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    /// Booked, nobody has joined yet
    Pending,
    /// The subject is in the room
    Connected,
    /// The subject has left the room
    Disconnected,
}

impl SlotState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotState::Pending => "pending",
            SlotState::Connected => "connected",
            SlotState::Disconnected => "disconnected",
        }
    }

    /// Transition table. Repeating the current state is allowed so that
    /// redelivered callbacks are harmless.
    pub fn can_transition_to(self, next: SlotState) -> bool {
        use SlotState::*;

        matches!(
            (self, next),
            (Pending, Pending)
                | (Pending, Connected)
                | (Connected, Connected)
                | (Connected, Disconnected)
                | (Disconnected, Disconnected)
                | (Disconnected, Connected)
        )
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SlotState::Pending),
            "connected" => Ok(SlotState::Connected),
            "disconnected" => Ok(SlotState::Disconnected),
            other => Err(Error::Validation(format!("Unknown slot state '{}'", other))),
        }
    }
}

/// Participants of a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotInfo {
    pub subject_name: String,
    pub host_name: String,
}

/// Full slot record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub slot_id: Uuid,
    pub info: SlotInfo,
    pub state: SlotState,
}

/// Slot as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSummary {
    pub slot_id: String,
    pub subject_name: String,
    pub host_name: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Result of a state change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateUpdate {
    /// The new state was written.
    Applied { from: SlotState, to: SlotState },
    /// The requester is not the slot's subject; nothing was written.
    IdentityMismatch,
    /// The transition table does not allow this move; nothing was written.
    InvalidTransition { from: SlotState, to: SlotState },
    /// Another update changed the state between our read and our write.
    Conflict,
}

/// Patient details held alongside slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub name: String,
    pub dob: String,
    pub nhs_number: String,
    pub notes: String,
}
