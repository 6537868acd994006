//! AssetGate error types.
//!
//! Every failure surfaced to a client carries a stable machine code from
//! [`AssetErrorCode`] and a human-readable message. The JSON body is
//! `{"code": "...", "message": "..."}`.

use std::fmt;

/// Stable error codes exposed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum AssetErrorCode {
    /// No caller identity could be established.
    Unauthenticated,
    /// Malformed input, disallowed type, or type mismatch.
    #[default]
    BadRequest,
    /// Asset (or referenced user) does not exist.
    NotFound,
    /// Caller is not the owner, or lacks a download grant.
    Forbidden,
    /// Stale version, or a lost race on a conditional write.
    VersionConflict,
    /// Upload ticket missing, already consumed, or expired.
    NotFoundOrUsed,
    /// The object store has no bytes at the asset's path.
    NotFoundOnStorage,
    /// Client digest differs from the stored bytes.
    IntegrityError,
    /// Unexpected server-side failure.
    InternalError,
}

impl AssetErrorCode {
    /// Returns the wire code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::BadRequest => "BAD_REQUEST",
            Self::NotFound => "NOT_FOUND",
            Self::Forbidden => "FORBIDDEN",
            Self::VersionConflict => "VERSION_CONFLICT",
            Self::NotFoundOrUsed => "NOT_FOUND_OR_USED",
            Self::NotFoundOnStorage => "NOT_FOUND_ON_STORAGE",
            Self::IntegrityError => "INTEGRITY_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        match self {
            Self::Unauthenticated => http::StatusCode::UNAUTHORIZED,
            Self::BadRequest => http::StatusCode::BAD_REQUEST,
            Self::NotFound => http::StatusCode::NOT_FOUND,
            Self::Forbidden => http::StatusCode::FORBIDDEN,
            Self::VersionConflict | Self::NotFoundOrUsed => http::StatusCode::CONFLICT,
            Self::NotFoundOnStorage => http::StatusCode::FAILED_DEPENDENCY,
            Self::IntegrityError => http::StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError => http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AssetErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors produced by asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// No identity on the request, or the identity could not be verified.
    #[error("Unauthenticated: {reason}")]
    Unauthenticated {
        /// Why authentication failed.
        reason: String,
    },

    /// Malformed request.
    #[error("{message}")]
    BadRequest {
        /// Description of the problem.
        message: String,
    },

    /// Declared media type is not on the allow-list.
    #[error("Media type not allowed: {mime}")]
    DisallowedMime {
        /// The rejected media type.
        mime: String,
    },

    /// Content sniffing disagreed with the declared media type.
    #[error("Declared type {declared} does not match content ({})", .sniffed.as_deref().unwrap_or("unrecognized"))]
    MimeMismatch {
        /// Media type declared at ticket issuance.
        declared: String,
        /// Media type recognized from the stored bytes, if any.
        sniffed: Option<String>,
    },

    /// A resource does not exist.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Kind of resource.
        resource: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    /// Caller is not permitted to perform the operation.
    #[error("Forbidden: user {user_id} may not access asset {asset_id}")]
    Forbidden {
        /// Asset being accessed.
        asset_id: String,
        /// Caller that was refused.
        user_id: String,
    },

    /// Caller's version is stale, or a concurrent writer won.
    #[error("Version conflict on asset {asset_id}: expected {expected}, found {actual}")]
    VersionConflict {
        /// Asset being mutated.
        asset_id: String,
        /// Version the caller presented.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Upload ticket is missing, already consumed, or expired.
    #[error("Upload ticket for asset {asset_id} is not usable: {reason}")]
    NotFoundOrUsed {
        /// Asset the ticket belongs to.
        asset_id: String,
        /// `missing`, `consumed` or `expired`.
        reason: &'static str,
    },

    /// No object at the storage path.
    #[error("Object not found on storage: {path}")]
    NotFoundOnStorage {
        /// Storage path that was read.
        path: String,
    },

    /// The object store already holds bytes at the path.
    #[error("Object already exists on storage: {path}")]
    ObjectExists {
        /// Storage path that was written.
        path: String,
    },

    /// Client digest does not match the stored bytes.
    #[error("Integrity check failed: expected {expected}, computed {actual}")]
    IntegrityError {
        /// Digest supplied by the client.
        expected: String,
        /// Digest of the stored bytes.
        actual: String,
    },

    /// Anything else.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AssetError {
    /// Returns the wire code for this error.
    #[must_use]
    pub fn code(&self) -> AssetErrorCode {
        match self {
            Self::Unauthenticated { .. } => AssetErrorCode::Unauthenticated,
            Self::BadRequest { .. } | Self::DisallowedMime { .. } | Self::MimeMismatch { .. } => {
                AssetErrorCode::BadRequest
            }
            Self::NotFound { .. } => AssetErrorCode::NotFound,
            Self::Forbidden { .. } => AssetErrorCode::Forbidden,
            Self::VersionConflict { .. } => AssetErrorCode::VersionConflict,
            Self::NotFoundOrUsed { .. } | Self::ObjectExists { .. } => {
                AssetErrorCode::NotFoundOrUsed
            }
            Self::NotFoundOnStorage { .. } => AssetErrorCode::NotFoundOnStorage,
            Self::IntegrityError { .. } => AssetErrorCode::IntegrityError,
            Self::Internal(_) => AssetErrorCode::InternalError,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> http::StatusCode {
        self.code().status_code()
    }

    /// Message safe to return to clients. Internal details are not exposed.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::Internal(_) => "Internal server error".to_owned(),
            other => other.to_string(),
        }
    }

    // -- Convenience constructors --

    /// Malformed request.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Missing or unverifiable identity.
    #[must_use]
    pub fn unauthenticated(reason: impl Into<String>) -> Self {
        Self::Unauthenticated {
            reason: reason.into(),
        }
    }

    /// Asset lookup miss.
    #[must_use]
    pub fn asset_not_found(id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource: "Asset",
            id: id.to_string(),
        }
    }

    /// User directory lookup miss.
    #[must_use]
    pub fn user_not_found(email: impl Into<String>) -> Self {
        Self::NotFound {
            resource: "User",
            id: email.into(),
        }
    }
}

/// Result alias for asset operations.
pub type AssetResult<T> = Result<T, AssetError>;
