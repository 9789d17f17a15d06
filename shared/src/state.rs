//! Per-process application state shared by every invocation of a Lambda.

use std::sync::Arc;

use crate::parameters::{ParameterStore, SsmParameterStore};
use crate::patients::PatientService;
use crate::slots::SlotService;
use crate::store::{DynamoSlotStore, SlotStore};
use crate::token::TokenIssuer;
use crate::{Config, Error, Result};

/// Services built once per cold start.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub slots: SlotService,
    pub tokens: TokenIssuer,
    pub patients: PatientService,
}

impl AppState {
    /// Wire the services over the given collaborators.
    pub fn new(
        config: Config,
        store: Arc<dyn SlotStore>,
        parameters: Arc<dyn ParameterStore>,
    ) -> Self {
        Self {
            slots: SlotService::new(store.clone(), &config.service_id),
            tokens: TokenIssuer::new(
                parameters,
                config.credential_parameters.clone(),
                config.token_ttl_secs,
            ),
            patients: PatientService::new(store, &config.service_id),
            config,
        }
    }

    /// Load configuration from the environment and connect to DynamoDB and SSM.
    pub async fn from_env() -> Result<Self> {
        let config = Config::from_env()
            .map_err(|e| Error::Config(format!("Missing environment variable: {}", e)))?;

        let aws_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.aws_region.clone()))
            .load()
            .await;

        let store = DynamoSlotStore::new(
            aws_sdk_dynamodb::Client::new(&aws_config),
            &config.appointment_table,
        );
        let parameters = SsmParameterStore::new(aws_sdk_ssm::Client::new(&aws_config));

        tracing::info!(
            table = %config.appointment_table,
            service_id = %config.service_id,
            "Application state initialised"
        );

        Ok(Self::new(config, Arc::new(store), Arc::new(parameters)))
    }
}
