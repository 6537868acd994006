//! AssetGate operation enum.

use std::fmt;

/// All supported RPC operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetOperation {
    // Upload protocol
    /// Issue an upload ticket and a signed upload URL.
    CreateUploadUrl,
    /// Verify the stored bytes and promote the asset.
    FinalizeUpload,

    // Asset mutations
    /// Change the display name.
    RenameAsset,
    /// Grant another user access.
    ShareAsset,
    /// Remove another user's access.
    RevokeShare,
    /// Delete the asset and its bytes.
    DeleteAsset,

    // Reads
    /// Issue a short-lived signed read URL.
    GetDownloadUrl,
    /// Read a single asset record.
    GetAsset,
    /// Page through the caller's own assets.
    MyAssets,
}

impl AssetOperation {
    /// Returns the operation name used in the target header.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateUploadUrl => "CreateUploadUrl",
            Self::FinalizeUpload => "FinalizeUpload",
            Self::RenameAsset => "RenameAsset",
            Self::ShareAsset => "ShareAsset",
            Self::RevokeShare => "RevokeShare",
            Self::DeleteAsset => "DeleteAsset",
            Self::GetDownloadUrl => "GetDownloadUrl",
            Self::GetAsset => "GetAsset",
            Self::MyAssets => "MyAssets",
        }
    }

    /// Parse an operation name into an `AssetOperation`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "CreateUploadUrl" => Some(Self::CreateUploadUrl),
            "FinalizeUpload" => Some(Self::FinalizeUpload),
            "RenameAsset" => Some(Self::RenameAsset),
            "ShareAsset" => Some(Self::ShareAsset),
            "RevokeShare" => Some(Self::RevokeShare),
            "DeleteAsset" => Some(Self::DeleteAsset),
            "GetDownloadUrl" => Some(Self::GetDownloadUrl),
            "GetAsset" => Some(Self::GetAsset),
            "MyAssets" => Some(Self::MyAssets),
            _ => None,
        }
    }

    /// Whether the operation changes persisted state.
    #[must_use]
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::GetDownloadUrl | Self::GetAsset | Self::MyAssets)
    }
}

impl fmt::Display for AssetOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
