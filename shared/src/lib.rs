//! Shared library for the slot booking Lambda functions.
//!
//! This crate holds the slot lifecycle, video token issuance, and the store
//! and parameter abstractions used by every Lambda function.

pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod parameters;
pub mod patients;
pub mod slots;
pub mod state;
pub mod store;
pub mod test_support;
pub mod token;

pub use config::{Config, CredentialParameterNames};
pub use error::{Error, Result};
pub use models::{PatientRecord, Slot, SlotInfo, SlotState, SlotSummary, StateUpdate};
pub use parameters::{ParameterStore, SsmParameterStore, StaticParameterStore};
pub use patients::PatientService;
pub use slots::{may_change_state, parse_slot_id, SlotService};
pub use state::AppState;
pub use store::{DynamoSlotStore, InMemorySlotStore, SlotStore};
pub use token::{AccessToken, TokenIssuer};
