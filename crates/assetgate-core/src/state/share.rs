//! Share edges and download audit rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetgate_model::types::{AssetId, UserId};

/// Grants another user access to an asset. Unique per `(asset, grantee)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetShare {
    /// Shared asset.
    pub asset_id: AssetId,
    /// Receiving user.
    pub grantee_id: UserId,
    /// Whether the grantee may obtain download URLs.
    pub can_download: bool,
    /// When the edge was first created.
    pub created_at: DateTime<Utc>,
}

/// One issued download URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadAudit {
    /// Downloaded asset.
    pub asset_id: AssetId,
    /// Caller who received the URL.
    pub user_id: UserId,
    /// Issuance time.
    pub at: DateTime<Utc>,
}
