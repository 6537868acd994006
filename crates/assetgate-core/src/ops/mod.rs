//! AssetGate operation handlers.
//!
//! Each submodule adds `handle_*` methods to
//! [`crate::provider::AssetGateProvider`]:
//!
//! - [`upload`]: `CreateUploadUrl`, `FinalizeUpload`
//! - [`asset`]: `RenameAsset`, `DeleteAsset`, `GetAsset`, `MyAssets`
//! - [`share`]: `ShareAsset`, `RevokeShare`, `GetDownloadUrl`
//!
//! The HTTP bridge in [`crate::handler`] routes operations to these methods.

pub mod asset;
pub mod share;
pub mod upload;
