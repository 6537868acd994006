//! Response payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AssetId, AssetView};

/// Output of `CreateUploadUrl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadUrlOutput {
    /// Newly assigned asset id.
    pub asset_id: AssetId,
    /// Where the bytes must be written.
    pub storage_path: String,
    /// Signed write authorization for the object store.
    pub upload_url: String,
    /// When the ticket and the upload URL stop being honored.
    pub expires_at: DateTime<Utc>,
    /// Random ticket nonce.
    pub nonce: String,
}

/// Output of `DeleteAsset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAssetOutput {
    /// Always `true` on success.
    pub deleted: bool,
}

/// Output of `GetDownloadUrl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDownloadUrlOutput {
    /// Signed, short-lived read URL.
    pub url: String,
    /// When the URL stops being honored.
    pub expires_at: DateTime<Utc>,
}

/// One entry of a [`MyAssetsOutput`] page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetEdge {
    /// Opaque cursor pointing at this entry.
    pub cursor: String,
    /// The asset itself.
    pub node: AssetView,
}

/// Pagination state of a [`MyAssetsOutput`] page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Cursor of the last entry, if the page is non-empty.
    pub end_cursor: Option<String>,
    /// Whether another page follows.
    pub has_next_page: bool,
}

/// Output of `MyAssets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyAssetsOutput {
    /// Page entries, newest first.
    pub edges: Vec<AssetEdge>,
    /// Pagination state.
    pub page_info: PageInfo,
}
