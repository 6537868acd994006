//! The mutation guard: load, ownership, version.
//!
//! Every state-changing operation runs [`MutationGuard::check`] before any
//! side effect. The check is advisory; the authoritative version test is
//! repeated by the record store's conditional write.

use assetgate_model::error::{AssetError, AssetResult};
use assetgate_model::types::{AssetId, UserId};

use crate::state::{AssetRecord, RecordStore};

/// Optimistic-concurrency precondition for record mutations.
#[derive(Debug, Clone, Copy)]
pub struct MutationGuard<'a> {
    records: &'a dyn RecordStore,
}

impl<'a> MutationGuard<'a> {
    /// Guard mutations against `records`.
    #[must_use]
    pub fn new(records: &'a dyn RecordStore) -> Self {
        Self { records }
    }

    /// Load the record and check that `user` owns it at `version`.
    ///
    /// # Errors
    ///
    /// [`AssetError::NotFound`] if the record is absent,
    /// [`AssetError::Forbidden`] if `user` is not the owner and
    /// [`AssetError::VersionConflict`] if `version` is stale.
    pub async fn check(
        &self,
        id: &AssetId,
        user: &UserId,
        version: u64,
    ) -> AssetResult<AssetRecord> {
        let record = self
            .records
            .get_asset(id)
            .await?
            .ok_or_else(|| AssetError::asset_not_found(id))?;
        check_record(&record, user, version)?;
        Ok(record)
    }
}

/// Ownership then version, against an already loaded record.
pub fn check_record(record: &AssetRecord, user: &UserId, version: u64) -> AssetResult<()> {
    if !record.is_owned_by(user) {
        return Err(AssetError::Forbidden {
            asset_id: record.id.to_string(),
            user_id: user.to_string(),
        });
    }
    if record.version != version {
        return Err(AssetError::VersionConflict {
            asset_id: record.id.to_string(),
            expected: version,
            actual: record.version,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;
    use crate::state::{InMemoryRecordStore, UploadTicket};

    async fn store_with(id: &str, owner: &str) -> InMemoryRecordStore {
        let store = InMemoryRecordStore::new();
        let now: DateTime<Utc> = Utc::now();
        store
            .create_upload(
                AssetRecord::new_uploading(
                    AssetId::new(id),
                    UserId::new(owner),
                    "a".into(),
                    "image/png".into(),
                    1,
                    "p".into(),
                    now,
                ),
                UploadTicket {
                    asset_id: AssetId::new(id),
                    user_id: UserId::new(owner),
                    nonce: "n".into(),
                    mime: "image/png".into(),
                    size: 1,
                    storage_path: "p".into(),
                    expires_at: now,
                    used: false,
                },
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_should_pass_owner_at_current_version() {
        let store = store_with("a", "u").await;
        let record = MutationGuard::new(&store)
            .check(&AssetId::new("a"), &UserId::new("u"), 1)
            .await
            .unwrap();
        assert_eq!(record.version, 1);
    }

    #[tokio::test]
    async fn test_should_check_ownership_before_version() {
        let store = store_with("a", "u").await;
        let err = MutationGuard::new(&store)
            .check(&AssetId::new("a"), &UserId::new("mallory"), 7)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_should_reject_stale_version() {
        let store = store_with("a", "u").await;
        let err = MutationGuard::new(&store)
            .check(&AssetId::new("a"), &UserId::new("u"), 2)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AssetError::VersionConflict { expected: 2, actual: 1, .. }
        ));
    }

    #[tokio::test]
    async fn test_should_report_missing_record() {
        let store = InMemoryRecordStore::new();
        let err = MutationGuard::new(&store)
            .check(&AssetId::new("x"), &UserId::new("u"), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::NotFound { resource: "Asset", .. }));
    }
}
