//! Slot lifecycle: booking, lookup, listing and room-event state changes.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::{Slot, SlotInfo, SlotState, SlotSummary, StateUpdate};
use crate::store::{query_all, Condition, Item, ItemKey, SlotStore, SORT_ATTR};
use crate::{Error, Result};

/// Sort key prefix for slot items.
pub const SLOT_PREFIX: &str = "slot:";

const SUBJECT_NAME: &str = "SubjectName";
const HOST_NAME: &str = "HostName";
const STATE: &str = "State";
const CREATED_AT: &str = "CreatedAt";
const UPDATED_AT: &str = "UpdatedAt";

/// Parse a slot id as given by a caller.
pub fn parse_slot_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| Error::Validation(format!("Invalid slot id '{}'", raw)))
}

/// Authorization policy for state changes: only the slot's subject may move it.
pub fn may_change_state(slot: &SlotInfo, requester: &str) -> bool {
    slot.subject_name == requester
}

/// Manages slots for one service id.
#[derive(Clone)]
pub struct SlotService {
    store: Arc<dyn SlotStore>,
    service_id: String,
}

impl SlotService {
    pub fn new(store: Arc<dyn SlotStore>, service_id: impl Into<String>) -> Self {
        Self {
            store,
            service_id: service_id.into(),
        }
    }

    fn key(&self, slot_id: &Uuid) -> ItemKey {
        ItemKey::new(&self.service_id, format!("{}{}", SLOT_PREFIX, slot_id))
    }

    /// Book a new slot in the `pending` state and return its id.
    pub async fn create_slot(&self, subject_name: &str, host_name: &str) -> Result<Uuid> {
        let slot_id = Uuid::new_v4();
        let attributes = Item::from([
            (SUBJECT_NAME.to_string(), subject_name.to_string()),
            (HOST_NAME.to_string(), host_name.to_string()),
            (STATE.to_string(), SlotState::Pending.to_string()),
            (CREATED_AT.to_string(), Utc::now().to_rfc3339()),
        ]);

        self.store.put_item(&self.key(&slot_id), attributes).await?;

        info!(%slot_id, "Created slot");
        Ok(slot_id)
    }

    /// Subject and host of a slot.
    pub async fn slot_info(&self, slot_id: &Uuid) -> Result<SlotInfo> {
        let item = self
            .store
            .get_item(&self.key(slot_id), &[SUBJECT_NAME, HOST_NAME])
            .await?
            .ok_or_else(|| Error::NotFound(format!("Slot {}", slot_id)))?;

        slot_info_from_item(slot_id, item)
    }

    /// Full slot record including its current state.
    pub async fn slot(&self, slot_id: &Uuid) -> Result<Slot> {
        let mut item = self
            .store
            .get_item(&self.key(slot_id), &[SUBJECT_NAME, HOST_NAME, STATE])
            .await?
            .ok_or_else(|| Error::NotFound(format!("Slot {}", slot_id)))?;

        let state = item
            .remove(STATE)
            .ok_or_else(|| Error::Persistence(format!("Slot {} has no state", slot_id)))?;
        let state = state.parse::<SlotState>().map_err(|_| {
            Error::Persistence(format!("Slot {} has unrecognised state '{}'", slot_id, state))
        })?;

        Ok(Slot {
            slot_id: *slot_id,
            info: slot_info_from_item(slot_id, item)?,
            state,
        })
    }

    /// Every slot of this service, in store order.
    pub async fn list_slots(&self) -> Result<Vec<SlotSummary>> {
        let items = query_all(
            self.store.as_ref(),
            &self.service_id,
            SLOT_PREFIX,
            &[SORT_ATTR, SUBJECT_NAME, HOST_NAME, STATE, CREATED_AT],
        )
        .await?;

        let slots = items
            .into_iter()
            .map(|mut item| {
                let sort_key = item.remove(SORT_ATTR).unwrap_or_default();
                SlotSummary {
                    slot_id: sort_key
                        .strip_prefix(SLOT_PREFIX)
                        .unwrap_or(&sort_key)
                        .to_string(),
                    subject_name: item.remove(SUBJECT_NAME).unwrap_or_default(),
                    host_name: item.remove(HOST_NAME).unwrap_or_default(),
                    state: item.remove(STATE).unwrap_or_default(),
                    created_at: item.remove(CREATED_AT),
                }
            })
            .collect();

        Ok(slots)
    }

    /// Apply a room event to a slot on behalf of `requester`.
    ///
    /// Identity mismatches and disallowed transitions are outcomes, not
    /// errors. The write is conditional on the state read beforehand.
    pub async fn update_slot_state(
        &self,
        slot_id: &Uuid,
        requester: &str,
        new_state: SlotState,
    ) -> Result<StateUpdate> {
        let slot = self.slot(slot_id).await?;

        if !may_change_state(&slot.info, requester) {
            info!(%slot_id, "Ignoring state change from non-subject participant");
            return Ok(StateUpdate::IdentityMismatch);
        }

        if !slot.state.can_transition_to(new_state) {
            warn!(%slot_id, from = %slot.state, to = %new_state, "Rejected slot state transition");
            return Ok(StateUpdate::InvalidTransition {
                from: slot.state,
                to: new_state,
            });
        }

        let updates = Item::from([
            (STATE.to_string(), new_state.to_string()),
            (UPDATED_AT.to_string(), Utc::now().to_rfc3339()),
        ]);
        let condition = Condition::equals(STATE, slot.state.as_str());

        match self
            .store
            .update_item(&self.key(slot_id), updates, Some(condition))
            .await
        {
            Ok(_) => {
                info!(%slot_id, from = %slot.state, to = %new_state, "Slot state updated");
                Ok(StateUpdate::Applied {
                    from: slot.state,
                    to: new_state,
                })
            }
            Err(Error::ConditionFailed(reason)) => {
                warn!(%slot_id, %reason, "Slot state changed concurrently");
                Ok(StateUpdate::Conflict)
            }
            Err(e) => Err(e),
        }
    }
}

fn slot_info_from_item(slot_id: &Uuid, mut item: Item) -> Result<SlotInfo> {
    let mut field = |name: &str| {
        item.remove(name)
            .ok_or_else(|| Error::Persistence(format!("Slot {} is missing {}", slot_id, name)))
    };

    Ok(SlotInfo {
        subject_name: field(SUBJECT_NAME)?,
        host_name: field(HOST_NAME)?,
    })
}
