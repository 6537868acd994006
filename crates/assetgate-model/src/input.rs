//! Request payloads, one per operation.

use serde::{Deserialize, Serialize};

use crate::types::{AssetId, AssetStatus};

/// Input for `CreateUploadUrl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUploadUrlInput {
    /// Client-supplied display name, sanitized server-side.
    pub filename: String,
    /// Declared media type; must be on the allow-list.
    pub mime: String,
    /// Declared size in bytes.
    pub size: u64,
}

/// Input for `FinalizeUpload`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalizeUploadInput {
    /// Asset to finalize.
    pub asset_id: AssetId,
    /// Hex SHA-256 the client computed before uploading.
    pub client_sha256: String,
    /// Version the client last observed.
    pub version: u64,
}

/// Input for `RenameAsset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameAssetInput {
    /// Asset to rename.
    pub asset_id: AssetId,
    /// New display name, sanitized server-side.
    pub filename: String,
    /// Version the client last observed.
    pub version: u64,
}

/// Input for `ShareAsset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareAssetInput {
    /// Asset to share.
    pub asset_id: AssetId,
    /// Grantee email, resolved through the user directory.
    pub to_email: String,
    /// Whether the grantee may obtain download URLs.
    pub can_download: bool,
    /// Version the client last observed.
    pub version: u64,
}

/// Input for `RevokeShare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeShareInput {
    /// Asset whose share edge is removed.
    pub asset_id: AssetId,
    /// Grantee email.
    pub to_email: String,
    /// Version the client last observed.
    pub version: u64,
}

/// Input for `DeleteAsset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAssetInput {
    /// Asset to delete.
    pub asset_id: AssetId,
    /// Version the client last observed.
    pub version: u64,
}

/// Input for `GetDownloadUrl`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetDownloadUrlInput {
    /// Asset to download.
    pub asset_id: AssetId,
}

/// Input for `GetAsset`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAssetInput {
    /// Asset to read.
    pub asset_id: AssetId,
}

/// Input for `MyAssets`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MyAssetsInput {
    /// Cursor returned as `endCursor` by the previous page.
    #[serde(default)]
    pub after: Option<String>,
    /// Requested page size.
    #[serde(default)]
    pub first: Option<u32>,
    /// Case-insensitive filename substring.
    #[serde(default)]
    pub q: Option<String>,
    /// Restrict to a single status.
    #[serde(default)]
    pub status: Option<AssetStatus>,
}
