//! Narrow bearer-token interface used by sibling auth stages.
//!
//! Only the shape of a credential lives here: acquiring, refreshing and
//! retrying tokens are the credential provider's business.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Errors returned by token credentials.
///
/// Messages never include token material.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CredentialError {
    /// The token is not a structurally valid JWT
    #[error("malformed token: {reason}")]
    MalformedToken { reason: &'static str },
}

/// Bearer token plus its expiry, when known
pub struct AccessToken {
    token: SecretString,
    expires_on: Option<SystemTime>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_on: Option<SystemTime>) -> Self {
        Self {
            token: SecretString::from(token.into()),
            expires_on,
        }
    }

    /// Raw token for building an `Authorization` header; never log it
    #[must_use]
    pub fn secret(&self) -> &str {
        self.token.expose_secret()
    }

    #[must_use]
    pub fn expires_on(&self) -> Option<SystemTime> {
        self.expires_on
    }
}

impl Clone for AccessToken {
    fn clone(&self) -> Self {
        Self::new(self.secret(), self.expires_on)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens
#[async_trait]
pub trait TokenCredential: Send + Sync {
    /// Current token
    ///
    /// # Errors
    /// Returns `CredentialError` when no valid token can be produced.
    async fn get_token(&self) -> Result<AccessToken, CredentialError>;
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: Option<u64>,
}

/// Credential wrapping a single, caller-supplied JWT.
///
/// The token is checked once, at construction: it must have three non-empty
/// dot-separated segments and a base64url payload holding a JSON object. A
/// numeric `exp` claim becomes the token's expiry. The token is never
/// refreshed.
#[derive(Clone, Debug)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    /// # Errors
    /// Returns `CredentialError::MalformedToken` when `token` is not a JWT.
    pub fn new(token: impl Into<String>) -> Result<Self, CredentialError> {
        let token = token.into();
        let expires_on = parse_expiry(&token)?;
        Ok(Self {
            token: AccessToken::new(token, expires_on),
        })
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn get_token(&self) -> Result<AccessToken, CredentialError> {
        Ok(self.token.clone())
    }
}

fn parse_expiry(token: &str) -> Result<Option<SystemTime>, CredentialError> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, signature] = segments.as_slice() else {
        return Err(CredentialError::MalformedToken {
            reason: "expected three dot-separated segments",
        });
    };
    if header.is_empty() || payload.is_empty() || signature.is_empty() {
        return Err(CredentialError::MalformedToken {
            reason: "empty segment",
        });
    }

    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| CredentialError::MalformedToken {
            reason: "payload is not base64url",
        })?;
    let claims: ExpiryClaim =
        serde_json::from_slice(&decoded).map_err(|_| CredentialError::MalformedToken {
            reason: "payload is not a JSON object with a numeric exp claim",
        })?;

    claims
        .exp
        .map(|exp| {
            UNIX_EPOCH
                .checked_add(Duration::from_secs(exp))
                .ok_or(CredentialError::MalformedToken {
                    reason: "exp claim is out of range",
                })
        })
        .transpose()
}
