//! Wire types for the AssetGate upload-ticket and finalize protocol.
//!
//! This crate holds everything that crosses the RPC boundary: the
//! operation enum, JSON request/response shapes, the asset status and view
//! types, and the closed error taxonomy with its stable machine-readable
//! codes. It has no I/O and no business logic.

pub mod error;
pub mod input;
pub mod operations;
pub mod output;
pub mod types;

pub use error::{AssetError, AssetErrorCode, AssetResult};
pub use operations::AssetOperation;
pub use types::{AssetId, AssetStatus, AssetView, Caller, UserId};
