//! Video access token issuance.
//!
//! Tokens are HS256 JWTs in the Twilio access token format: signed with the
//! API secret, issued by the API key, for the account, carrying a single
//! video grant.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::CredentialParameterNames;
use crate::parameters::ParameterStore;
use crate::{Error, Result};

/// Content type marking a Twilio access token.
pub const ACCESS_TOKEN_CONTENT_TYPE: &str = "twilio-fpa;v=1";

/// Longest lifetime the video service accepts for an access token.
pub const MAX_TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Access to exactly one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoGrant {
    pub room: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    pub identity: String,
    pub video: VideoGrant,
}

/// JWT claims of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Unique token id: `<api key>-<issued at>`
    pub jti: String,
    /// API key
    pub iss: String,
    /// Account id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub grants: Grants,
}

/// A signed access token.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Credentials used to sign access tokens.
struct VideoCredentials {
    account_id: String,
    api_key: String,
    api_secret: String,
}

/// Mints room-scoped access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    parameters: Arc<dyn ParameterStore>,
    names: CredentialParameterNames,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(
        parameters: Arc<dyn ParameterStore>,
        names: CredentialParameterNames,
        ttl_secs: u64,
    ) -> Self {
        Self {
            parameters,
            names,
            ttl: Duration::seconds(ttl_secs.min(MAX_TOKEN_TTL_SECS) as i64),
        }
    }

    async fn resolve(&self, name: &str) -> Result<String> {
        self.parameters.get_parameter(name).await.map_err(|e| {
            error!(parameter = name, error = %e, "Failed to resolve signing credential");
            Error::Config(format!("Could not resolve {}: {}", name, e))
        })
    }

    /// Fetched on every call, one after another.
    async fn credentials(&self) -> Result<VideoCredentials> {
        Ok(VideoCredentials {
            account_id: self.resolve(&self.names.account_id).await?,
            api_key: self.resolve(&self.names.api_key).await?,
            api_secret: self.resolve(&self.names.api_secret).await?,
        })
    }

    /// Issue a token letting `identity` join `room_name` and nothing else.
    pub async fn issue_token(&self, identity: &str, room_name: &str) -> Result<AccessToken> {
        if identity.is_empty() || room_name.is_empty() {
            return Err(Error::Validation(
                "Identity and room name are required".to_string(),
            ));
        }

        let credentials = self.credentials().await?;

        let issued_at = Utc::now();
        let expires_at = issued_at + self.ttl;
        let claims = AccessTokenClaims {
            jti: format!("{}-{}", credentials.api_key, issued_at.timestamp()),
            iss: credentials.api_key,
            sub: credentials.account_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            grants: Grants {
                identity: identity.to_string(),
                video: VideoGrant {
                    room: room_name.to_string(),
                },
            },
        };

        let mut header = Header::new(Algorithm::HS256);
        header.cty = Some(ACCESS_TOKEN_CONTENT_TYPE.to_string());

        let token = encode(
            &header,
            &claims,
            &EncodingKey::from_secret(credentials.api_secret.as_bytes()),
        )?;

        info!(room = room_name, "Issued video access token");
        Ok(AccessToken { token, expires_at })
    }
}
