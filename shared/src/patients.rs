//! Patient record lookup.

use std::sync::Arc;

use crate::models::PatientRecord;
use crate::store::{ItemKey, SlotStore};
use crate::{Error, Result};

/// Sort key prefix for patient items.
pub const PATIENT_PREFIX: &str = "patient:";

const PATIENT_NAME: &str = "PatientName";
const DOB: &str = "Dob";
const NHS_NUMBER: &str = "NhsNumber";
const NOTES: &str = "Notes";

/// Read-only access to patient records stored next to the slots.
#[derive(Clone)]
pub struct PatientService {
    store: Arc<dyn SlotStore>,
    service_id: String,
}

impl PatientService {
    pub fn new(store: Arc<dyn SlotStore>, service_id: impl Into<String>) -> Self {
        Self {
            store,
            service_id: service_id.into(),
        }
    }

    pub async fn patient(&self, name: &str) -> Result<PatientRecord> {
        if name.is_empty() {
            return Err(Error::Validation("Patient identity is required".to_string()));
        }

        let key = ItemKey::new(&self.service_id, format!("{}{}", PATIENT_PREFIX, name));
        let mut item = self
            .store
            .get_item(&key, &[PATIENT_NAME, DOB, NHS_NUMBER, NOTES])
            .await?
            .ok_or_else(|| Error::NotFound(format!("Patient {}", name)))?;

        Ok(PatientRecord {
            name: item.remove(PATIENT_NAME).unwrap_or_else(|| name.to_string()),
            dob: item.remove(DOB).unwrap_or_default(),
            nhs_number: item.remove(NHS_NUMBER).unwrap_or_default(),
            notes: item.remove(NOTES).unwrap_or_default(),
        })
    }
}
