//! Object record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetgate_model::types::{AssetId, AssetStatus, AssetView, UserId};

/// The persisted record of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Immutable identifier.
    pub id: AssetId,
    /// Creator; the only identity allowed to mutate the record.
    pub owner_id: UserId,
    /// Sanitized display name.
    pub filename: String,
    /// Declared media type, fixed at issuance.
    pub mime: String,
    /// Declared size, fixed at issuance.
    pub size: u64,
    /// Where the bytes live; derived at issuance and never changed.
    pub storage_path: String,
    /// Lifecycle state.
    pub status: AssetStatus,
    /// Digest of the stored bytes, once a download-and-hash has run.
    pub sha256: Option<String>,
    /// Optimistic lock token, starting at 1.
    pub version: u64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl AssetRecord {
    /// A fresh record in `uploading` state at version 1.
    #[must_use]
    pub fn new_uploading(
        id: AssetId,
        owner_id: UserId,
        filename: String,
        mime: String,
        size: u64,
        storage_path: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner_id,
            filename,
            mime,
            size,
            storage_path,
            status: AssetStatus::Uploading,
            sha256: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user` created this asset.
    #[must_use]
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }

    /// Client-facing snapshot.
    #[must_use]
    pub fn view(&self) -> AssetView {
        AssetView {
            id: self.id.clone(),
            filename: self.filename.clone(),
            mime: self.mime.clone(),
            size: self.size,
            sha256: self.sha256.clone(),
            status: self.status,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A version-gated mutation, applied atomically by the record store.
///
/// Every variant bumps `version` by one and refreshes `updated_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordChange {
    /// Finalize succeeded: `ready` with the verified digest.
    MarkReady {
        /// Verified digest.
        sha256: String,
    },
    /// Replace the display name.
    Rename {
        /// New sanitized name.
        filename: String,
    },
    /// Insert or update the share edge for `grantee`.
    UpsertShare {
        /// Receiving user.
        grantee: UserId,
        /// Whether downloads are allowed.
        can_download: bool,
    },
    /// Remove the share edge for `grantee`, if any.
    RemoveShare {
        /// User losing access.
        grantee: UserId,
    },
    /// Version bump with no other effect; claims the record before a delete.
    Claim,
}

impl RecordChange {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MarkReady { .. } => "mark_ready",
            Self::Rename { .. } => "rename",
            Self::UpsertShare { .. } => "upsert_share",
            Self::RemoveShare { .. } => "remove_share",
            Self::Claim => "claim",
        }
    }

    /// Apply the record-local part of the change. Share edges are written
    /// by the store.
    pub(crate) fn apply_to(&self, record: &mut AssetRecord, now: DateTime<Utc>) {
        match self {
            Self::MarkReady { sha256 } => {
                record.status = AssetStatus::Ready;
                record.sha256 = Some(sha256.clone());
            }
            Self::Rename { filename } => record.filename.clone_from(filename),
            Self::UpsertShare { .. } | Self::RemoveShare { .. } | Self::Claim => {}
        }
        record.version += 1;
        record.updated_at = now;
    }
}
