//! In-memory wiring for handler tests and local runs.

use std::sync::Arc;

use crate::config::CredentialParameterNames;
use crate::parameters::StaticParameterStore;
use crate::store::InMemorySlotStore;
use crate::{AppState, Config};

/// Service id used by [`in_memory_state`].
pub const TEST_SERVICE_ID: &str = "test-service";

/// Secret the in-memory credentials sign tokens with.
pub const TEST_API_SECRET: &str = "test-api-secret";

/// Parameter store holding every credential the token issuer needs.
pub fn credential_store() -> StaticParameterStore {
    let names = CredentialParameterNames::default();
    StaticParameterStore::new()
        .with(names.account_id, "AC-test-account")
        .with(names.api_key, "SK-test-key")
        .with(names.api_secret, TEST_API_SECRET)
}

/// App state over an in-memory store, returned alongside for inspection.
pub fn in_memory_state(page_size: usize) -> (AppState, Arc<InMemorySlotStore>) {
    let store = Arc::new(InMemorySlotStore::with_page_size(page_size));
    let state = AppState::new(
        Config::local(TEST_SERVICE_ID),
        store.clone(),
        Arc::new(credential_store()),
    );
    (state, store)
}
