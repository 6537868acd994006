//! Common type definitions shared across the RPC surface.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque asset identifier, assigned at ticket issuance and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// Stable user identifier as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an existing identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// The authenticated identity on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Resolved user identifier.
    pub user_id: UserId,
}

impl Caller {
    /// Create a caller for the given user.
    #[must_use]
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId::new(user_id),
        }
    }
}

/// Lifecycle state of an asset.
///
/// `Uploading` is the only non-terminal state. Once an asset leaves it,
/// it never returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    /// Ticket issued, bytes not yet verified.
    Uploading,
    /// Finalize verified type and digest.
    Ready,
    /// A verification step failed.
    Corrupt,
}

impl AssetStatus {
    /// Canonical lowercase name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploading => "uploading",
            Self::Ready => "ready",
            Self::Corrupt => "corrupt",
        }
    }

    /// Whether the status can still be changed by finalize.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Uploading)
    }
}

impl fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an [`AssetStatus`] fails.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown asset status: {0}")]
pub struct ParseAssetStatusError(String);

impl FromStr for AssetStatus {
    type Err = ParseAssetStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "uploading" => Ok(Self::Uploading),
            "ready" => Ok(Self::Ready),
            "corrupt" => Ok(Self::Corrupt),
            _ => Err(ParseAssetStatusError(s.to_owned())),
        }
    }
}

/// Client-facing snapshot of an asset record.
///
/// Owner identity and storage path are deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetView {
    /// Asset identifier.
    pub id: AssetId,
    /// Sanitized display name.
    pub filename: String,
    /// Declared media type.
    pub mime: String,
    /// Declared size in bytes.
    pub size: u64,
    /// Hex SHA-256 of the stored bytes, once computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Lifecycle state.
    pub status: AssetStatus,
    /// Optimistic lock token.
    pub version: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_status_case_insensitively() {
        assert_eq!("READY".parse::<AssetStatus>().unwrap(), AssetStatus::Ready);
        assert_eq!(
            "uploading".parse::<AssetStatus>().unwrap(),
            AssetStatus::Uploading
        );
        assert!("deleted".parse::<AssetStatus>().is_err());
    }

    #[test]
    fn test_should_serialize_status_lowercase() {
        let json = serde_json::to_string(&AssetStatus::Corrupt).unwrap();
        assert_eq!(json, "\"corrupt\"");
    }

    #[test]
    fn test_should_report_terminal_states() {
        assert!(!AssetStatus::Uploading.is_terminal());
        assert!(AssetStatus::Ready.is_terminal());
        assert!(AssetStatus::Corrupt.is_terminal());
    }

    #[test]
    fn test_should_serialize_ids_transparently() {
        let id = AssetId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
        assert_eq!(UserId::from("u1").to_string(), "u1");
    }
}
