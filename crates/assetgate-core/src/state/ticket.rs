//! Upload tickets.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use assetgate_model::types::{AssetId, UserId};

/// One-time authorization binding an asset to its expected upload.
///
/// Keyed by the asset id. `used` flips from `false` to `true` exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadTicket {
    /// Asset the ticket belongs to.
    pub asset_id: AssetId,
    /// Owner the ticket was issued to.
    pub user_id: UserId,
    /// Random hex nonce.
    pub nonce: String,
    /// Declared media type.
    pub mime: String,
    /// Declared size.
    pub size: u64,
    /// Where the bytes must be uploaded.
    pub storage_path: String,
    /// After this instant the ticket can no longer finalize.
    pub expires_at: DateTime<Utc>,
    /// Whether the ticket has been consumed.
    pub used: bool,
}

impl UploadTicket {
    /// Whether the ticket is past its expiry at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
