//! Error types for request authentication.

/// Errors that can occur while authenticating a request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Neither a bearer token nor an accepted identity header was present.
    #[error("Missing credentials")]
    MissingCredential,

    /// The `Authorization` header is not a well-formed bearer token.
    #[error("Invalid Authorization header format")]
    InvalidAuthHeader,

    /// The identity provider rejected the token.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// An `x-user-id` header was sent but header identities are disabled.
    #[error("Identity header is not accepted by this server")]
    IdentityHeaderDisabled,

    /// The identity provider could not be reached or answered unexpectedly.
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// The computed URL signature does not match the provided signature.
    #[error("Signature does not match")]
    SignatureDoesNotMatch,

    /// The signed URL is past its expiry.
    #[error("Request has expired")]
    RequestExpired,

    /// A required query parameter for signed URL authentication is missing.
    #[error("Missing required query parameter: {0}")]
    MissingQueryParam(String),
}
