// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service-account credentials for the Cloud Vision API
//!
//! Implements the OAuth2 JWT-bearer grant: a self-signed RS256 assertion is
//! exchanged at the key's `token_uri` for a short-lived access token.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::OcrError;

pub const CLOUD_VISION_SCOPE: &str = "https://www.googleapis.com/auth/cloud-vision";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a service-account JSON key that the token exchange needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub project_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_json(json: &str) -> Result<Self, OcrError> {
        serde_json::from_str(json).map_err(|e| OcrError::Credentials(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, OcrError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            OcrError::Credentials(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&json)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    /// Reusable until `EXPIRY_MARGIN_SECS` before it expires
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now
    }
}

/// Issues and caches access tokens for one service account
pub struct ServiceAccountTokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    client: Client,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenSource {
    pub fn new(key: ServiceAccountKey, client: Client) -> Result<Self, OcrError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| OcrError::Credentials(format!("invalid private key: {}", e)))?;

        info!(
            "Cloud Vision service account: {} (project: {})",
            key.client_email,
            key.project_id.as_deref().unwrap_or("unknown")
        );

        Ok(Self {
            key,
            encoding_key,
            client,
            cached: Mutex::new(None),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.key.client_email
    }

    /// Signed JWT assertion valid for one hour from `now`
    pub fn assertion(&self, now: DateTime<Utc>) -> Result<String, OcrError> {
        let claims = AssertionClaims {
            iss: self.key.client_email.clone(),
            scope: CLOUD_VISION_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
            .map_err(|e| OcrError::Credentials(format!("cannot sign assertion: {}", e)))
    }

    /// Current access token, exchanging a fresh assertion when the cached one is stale
    pub async fn access_token(&self) -> Result<String, OcrError> {
        let mut cached = self.cached.lock().await;
        let now = Utc::now();

        if let Some(ref token) = *cached {
            if token.is_fresh(now) {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Exchanging service-account assertion at {}", self.key.token_uri);
        let assertion = self.assertion(now)?;
        let response = self
            .client
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OcrError::Status { status, body });
        }

        let token: TokenResponse = response.json().await?;
        let access_token = token.access_token.clone();
        *cached = Some(CachedToken {
            access_token: token.access_token,
            expires_at: now + Duration::seconds(token.expires_in),
        });

        Ok(access_token)
    }
}
