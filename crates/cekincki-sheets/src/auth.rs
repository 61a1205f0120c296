//! OAuth access tokens for the Sheets API
//!
//! Service accounts authenticate with a self-signed RS256 JWT that is
//! exchanged for a short-lived bearer token at the key's token URI.

use crate::credentials::ServiceAccountKey;
use crate::error::{SheetsError, SheetsResult};
use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// Read/write access to spreadsheets
pub const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;
const REFRESH_SKEW_SECS: i64 = 60;

/// Anything that can produce a bearer token for API calls
#[async_trait]
pub trait AccessTokenSource: Send + Sync {
    async fn access_token(&self) -> SheetsResult<String>;
}

/// Fixed token, for tests and pre-authorised environments
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl AccessTokenSource for StaticToken {
    async fn access_token(&self) -> SheetsResult<String> {
        Ok(self.0.clone())
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    TOKEN_LIFETIME_SECS
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: i64,
}

/// Service account token provider with caching
pub struct TokenProvider {
    key: ServiceAccountKey,
    client: Client,
    token_uri: String,
    scope: String,
    cached: RwLock<Option<CachedToken>>,
}

impl std::fmt::Debug for TokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenProvider")
            .field("client_email", &self.key.client_email)
            .field("token_uri", &self.token_uri)
            .field("scope", &self.scope)
            .finish()
    }
}

impl TokenProvider {
    pub fn new(key: ServiceAccountKey, client: Client) -> Self {
        let token_uri = key
            .token_uri
            .clone()
            .unwrap_or_else(|| DEFAULT_TOKEN_URI.to_string());
        Self {
            key,
            client,
            token_uri,
            scope: SHEETS_SCOPE.to_string(),
            cached: RwLock::new(None),
        }
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    fn signed_assertion(&self, now: i64) -> SheetsResult<String> {
        let claims = Claims {
            iss: &self.key.client_email,
            scope: &self.scope,
            aud: &self.token_uri,
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.key.private_key.as_bytes())?;
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &key,
        )?)
    }

    async fn fetch(&self) -> SheetsResult<CachedToken> {
        let now = Utc::now().timestamp();
        let assertion = self.signed_assertion(now)?;

        let response = self
            .client
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetsError::Auth(format!("{} - {}", status.as_u16(), body)));
        }

        let token: TokenResponse = response.json().await?;
        if token.access_token.is_empty() {
            return Err(SheetsError::Auth("No access token returned".to_string()));
        }

        tracing::debug!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "Obtained Google access token"
        );

        Ok(CachedToken {
            token: token.access_token,
            expires_at: now + token.expires_in,
        })
    }
}

#[async_trait]
impl AccessTokenSource for TokenProvider {
    async fn access_token(&self) -> SheetsResult<String> {
        let now = Utc::now().timestamp();
        {
            let cached = self.cached.read().await;
            if let Some(token) = cached.as_ref() {
                if token.expires_at - REFRESH_SKEW_SECS > now {
                    return Ok(token.token.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at - REFRESH_SKEW_SECS > now {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.fetch().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }
}
