//! Configuration management for Lambda functions.

use std::env;

/// Default partition key value for a single-tenant deployment.
pub const DEFAULT_SERVICE_ID: &str = "test-service";

/// Default lifetime of an issued video access token, in seconds.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Names of the Parameter Store entries holding the video API credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialParameterNames {
    pub account_id: String,
    pub api_key: String,
    pub api_secret: String,
}

impl Default for CredentialParameterNames {
    fn default() -> Self {
        Self {
            account_id: "/twilio/account-id".to_string(),
            api_key: "/twilio/api-key".to_string(),
            api_secret: "/twilio/api-secret".to_string(),
        }
    }
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// DynamoDB table holding slots and patient records
    pub appointment_table: String,
    /// Partition key shared by every item this deployment owns
    pub service_id: String,
    /// AWS region
    pub aws_region: String,
    /// Parameter names for the video API credentials
    pub credential_parameters: CredentialParameterNames,
    /// Access token lifetime
    pub token_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, env::VarError> {
        let defaults = CredentialParameterNames::default();

        Ok(Self {
            appointment_table: env::var("APPOINTMENT_TABLE")?,
            service_id: env::var("SERVICE_ID").unwrap_or_else(|_| DEFAULT_SERVICE_ID.to_string()),
            aws_region: env::var("AWS_REGION").unwrap_or_else(|_| "eu-west-2".to_string()),
            credential_parameters: CredentialParameterNames {
                account_id: env::var("TWILIO_ACCOUNT_ID_PARAM").unwrap_or(defaults.account_id),
                api_key: env::var("TWILIO_API_KEY_PARAM").unwrap_or(defaults.api_key),
                api_secret: env::var("TWILIO_API_SECRET_PARAM").unwrap_or(defaults.api_secret),
            },
            token_ttl_secs: env::var("TOKEN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOKEN_TTL_SECS),
        })
    }

    /// Configuration for tests and local runs against in-memory collaborators.
    pub fn local(service_id: impl Into<String>) -> Self {
        Self {
            appointment_table: "appointments".to_string(),
            service_id: service_id.into(),
            aws_region: "eu-west-2".to_string(),
            credential_parameters: CredentialParameterNames::default(),
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        }
    }
}
