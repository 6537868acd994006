//! Conversions from collaborator errors into [`AssetError`].
//!
//! The record store and the object store report failures in their own
//! terms. This module maps them onto the wire taxonomy at the core
//! boundary so operation code can use `?` throughout.

use assetgate_model::error::AssetError;

use crate::state::RecordError;
use crate::storage::StorageError;

impl From<RecordError> for AssetError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::NotFound(id) => AssetError::asset_not_found(id),
            RecordError::VersionMismatch {
                asset_id,
                expected,
                actual,
            } => AssetError::VersionConflict {
                asset_id: asset_id.to_string(),
                expected,
                actual,
            },
            RecordError::InvalidCursor(cursor) => {
                AssetError::bad_request(format!("Invalid cursor: {cursor}"))
            }
            RecordError::AlreadyExists(id) => {
                AssetError::Internal(anyhow::anyhow!("asset id collision: {id}"))
            }
            RecordError::Internal(e) => AssetError::Internal(e),
        }
    }
}

impl From<StorageError> for AssetError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { path, .. } => AssetError::NotFoundOnStorage { path },
            StorageError::AlreadyExists { path, .. } => AssetError::ObjectExists { path },
            StorageError::Internal(e) => AssetError::Internal(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use assetgate_model::error::AssetErrorCode;
    use assetgate_model::types::AssetId;

    use super::*;

    #[test]
    fn test_should_map_version_mismatch_to_conflict() {
        let err: AssetError = RecordError::VersionMismatch {
            asset_id: AssetId::new("a"),
            expected: 1,
            actual: 3,
        }
        .into();
        assert_eq!(err.code(), AssetErrorCode::VersionConflict);
        assert!(err.to_string().contains("found 3"));
    }

    #[test]
    fn test_should_map_missing_object_to_not_found_on_storage() {
        let err: AssetError = StorageError::NotFound {
            bucket: "private".into(),
            path: "p/q".into(),
        }
        .into();
        assert!(matches!(err, AssetError::NotFoundOnStorage { ref path } if path == "p/q"));
    }

    #[test]
    fn test_should_map_existing_object_to_object_exists() {
        let err: AssetError = StorageError::AlreadyExists {
            bucket: "private".into(),
            path: "p/q".into(),
        }
        .into();
        assert!(matches!(err, AssetError::ObjectExists { ref path } if path == "p/q"));
    }

    #[test]
    fn test_should_map_bad_cursor_to_bad_request() {
        let err: AssetError = RecordError::InvalidCursor("zz".into()).into();
        assert_eq!(err.code(), AssetErrorCode::BadRequest);
    }
}
