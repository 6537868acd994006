//! AssetGate request router.
//!
//! Every RPC request is `POST /` with the operation named in the
//! `X-AssetGate-Target` header:
//!
//! ```text
//! X-AssetGate-Target: AssetGate_v1.FinalizeUpload
//! ```

use assetgate_model::error::AssetError;
use assetgate_model::operations::AssetOperation;

/// Header carrying the operation name.
pub const TARGET_HEADER: &str = "x-assetgate-target";

/// The expected prefix for the target header value.
pub const TARGET_PREFIX: &str = "AssetGate_v1.";

/// Resolve an AssetGate operation from request headers.
pub fn resolve_operation(headers: &http::HeaderMap) -> Result<AssetOperation, AssetError> {
    let target = headers
        .get(TARGET_HEADER)
        .ok_or_else(|| AssetError::bad_request("Missing required header: X-AssetGate-Target"))?;

    let target_str = target
        .to_str()
        .map_err(|_| AssetError::bad_request("Invalid X-AssetGate-Target header"))?;

    let operation_name = target_str
        .strip_prefix(TARGET_PREFIX)
        .ok_or_else(|| AssetError::bad_request(format!("Unknown operation: {target_str}")))?;

    AssetOperation::from_name(operation_name)
        .ok_or_else(|| AssetError::bad_request(format!("Unknown operation: {target_str}")))
}
