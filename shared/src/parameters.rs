//! AWS Systems Manager Parameter Store integration.
//!
//! Lookups are never cached: every caller gets a fresh read.

use async_trait::async_trait;
use aws_sdk_ssm::operation::get_parameter::GetParameterError;
use aws_sdk_ssm::Client as SsmClient;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{Error, Result};

/// Source of named secrets.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Fetch a parameter value. Missing or inaccessible parameters are [`Error::NotFound`].
    async fn get_parameter(&self, name: &str) -> Result<String>;
}

/// Parameter store backed by SSM, decrypting `SecureString` values.
pub struct SsmParameterStore {
    client: SsmClient,
}

impl SsmParameterStore {
    pub fn new(client: SsmClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<String> {
        let response = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(true)
            .send()
            .await
            .map_err(|e| match e.as_service_error() {
                Some(GetParameterError::ParameterNotFound(_)) => {
                    Error::NotFound(format!("Parameter {}", name))
                }
                _ => Error::NotFound(format!("Parameter {} is not accessible: {}", name, e)),
            })?;

        response
            .parameter()
            .and_then(|p| p.value())
            .map(str::to_string)
            .ok_or_else(|| Error::NotFound(format!("Parameter {} has no value", name)))
    }
}

/// Map-backed parameter store for tests and local runs.
#[derive(Default)]
pub struct StaticParameterStore {
    values: HashMap<String, String>,
    fetches: AtomicUsize,
}

impl StaticParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Number of lookups served, including failed ones.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParameterStore for StaticParameterStore {
    async fn get_parameter(&self, name: &str) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Parameter {}", name)))
    }
}
