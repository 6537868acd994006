//! Identity provider trait and implementations.
//!
//! An [`IdentityProvider`] turns an opaque bearer token into a stable user
//! id. [`StaticIdentityProvider`] serves fixed tokens for development and
//! tests; [`RemoteIdentityProvider`] asks an external auth service.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::AuthError;

/// Resolves bearer tokens to user ids.
#[async_trait]
pub trait IdentityProvider: Send + Sync + fmt::Debug {
    /// Resolve `token` to the id of the user it was issued to.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the token is not recognized, or
    /// [`AuthError::Provider`] if the provider itself failed.
    async fn resolve_bearer(&self, token: &str) -> Result<String, AuthError>;
}

/// An in-memory token table.
///
/// # Examples
///
/// ```
/// use assetgate_auth::identity::StaticIdentityProvider;
///
/// let provider = StaticIdentityProvider::parse("tok-a=alice, tok-b=bob");
/// assert_eq!(provider.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityProvider {
    tokens: HashMap<String, String>,
}

impl StaticIdentityProvider {
    /// Create a provider from `(token, user_id)` pairs.
    pub fn new(tokens: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            tokens: tokens.into_iter().collect(),
        }
    }

    /// Parse a `token=user,token=user` list. Malformed entries are skipped.
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let tokens = spec.split(',').filter_map(|entry| {
            let (token, user) = entry.split_once('=')?;
            let (token, user) = (token.trim(), user.trim());
            (!token.is_empty() && !user.is_empty()).then(|| (token.to_owned(), user.to_owned()))
        });
        Self::new(tokens)
    }

    /// Number of known tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn resolve_bearer(&self, token: &str) -> Result<String, AuthError> {
        self.tokens
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

/// Asks an external auth service who owns a token.
///
/// Issues `GET {endpoint}/auth/v1/user` with the token as bearer and reads
/// the `id` field of the JSON response.
#[derive(Debug, Clone)]
pub struct RemoteIdentityProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
}

impl RemoteIdentityProvider {
    /// Create a provider for the given base endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_owned(),
            api_key,
        }
    }

    fn user_url(&self) -> String {
        format!("{}/auth/v1/user", self.endpoint)
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn resolve_bearer(&self, token: &str) -> Result<String, AuthError> {
        let mut request = self.client.get(self.user_url()).bearer_auth(token);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            debug!(%status, "Identity provider rejected token");
            return Err(AuthError::InvalidToken);
        }
        if !status.is_success() {
            return Err(AuthError::Provider(format!("unexpected status {status}")));
        }

        let user: RemoteUser = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        if user.id.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(user.id)
    }
}
