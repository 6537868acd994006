//! Caller resolution from request headers.

use tracing::debug;

use crate::error::AuthError;
use crate::identity::IdentityProvider;

/// Header carrying a trusted user id in local development.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Resolve the user id of the caller.
///
/// A bearer token always wins and is checked against `provider`. Without
/// one, the `x-user-id` header is honored only if `allow_identity_header`
/// is set.
///
/// # Errors
///
/// Returns [`AuthError::MissingCredential`] when nothing identifies the
/// caller, [`AuthError::InvalidAuthHeader`] for a malformed `Authorization`
/// header, and whatever the provider returns for a rejected token.
pub async fn resolve_caller(
    headers: &http::HeaderMap,
    provider: Option<&dyn IdentityProvider>,
    allow_identity_header: bool,
) -> Result<String, AuthError> {
    if let Some(value) = headers.get(http::header::AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = parse_bearer(value)?;
        let provider = provider
            .ok_or_else(|| AuthError::Provider("no identity provider configured".to_owned()))?;
        let user_id = provider.resolve_bearer(token).await?;
        debug!(user_id, "Resolved caller from bearer token");
        return Ok(user_id);
    }

    if let Some(value) = headers.get(IDENTITY_HEADER) {
        if !allow_identity_header {
            return Err(AuthError::IdentityHeaderDisabled);
        }
        let user_id = value
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?
            .trim();
        if user_id.is_empty() {
            return Err(AuthError::MissingCredential);
        }
        debug!(user_id, "Resolved caller from identity header");
        return Ok(user_id.to_owned());
    }

    Err(AuthError::MissingCredential)
}

fn parse_bearer(value: &str) -> Result<&str, AuthError> {
    let (scheme, token) = value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }
    Ok(token)
}
