//! The record store seam.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use assetgate_model::types::{AssetId, AssetStatus, UserId};

use super::asset::{AssetRecord, RecordChange};
use super::share::{AssetShare, DownloadAudit};
use super::ticket::UploadTicket;

/// Errors raised by a [`RecordStore`].
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    /// No record with this id.
    #[error("Asset not found: {0}")]
    NotFound(AssetId),

    /// The conditional write saw a different version.
    #[error("Version mismatch on {asset_id}: expected {expected}, found {actual}")]
    VersionMismatch {
        /// Record being written.
        asset_id: AssetId,
        /// Version the write was conditioned on.
        expected: u64,
        /// Version actually stored.
        actual: u64,
    },

    /// An asset with this id already exists.
    #[error("Asset already exists: {0}")]
    AlreadyExists(AssetId),

    /// A listing cursor does not point at one of the owner's assets.
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Backend failure.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result of an atomic ticket consumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketConsumption {
    /// This call flipped `used` from `false` to `true`. Carries the ticket
    /// as it was before the flip.
    Consumed(UploadTicket),
    /// The ticket exists but was consumed earlier.
    AlreadyUsed,
    /// No ticket was ever issued for the id.
    Missing,
}

/// Filter and paging options for [`RecordStore::list_owned`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Id of the last item of the previous page.
    pub after: Option<AssetId>,
    /// Maximum number of items to return.
    pub limit: usize,
    /// Only records in this state.
    pub status: Option<AssetStatus>,
    /// Only records whose filename contains this, ignoring case.
    pub filename_contains: Option<String>,
}

/// One page of [`RecordStore::list_owned`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetPage {
    /// Records, newest first.
    pub items: Vec<AssetRecord>,
    /// Whether more records match after the last one.
    pub has_next_page: bool,
}

/// Persistence for records, tickets, shares and audits.
///
/// Methods documented as atomic must be a single conditional operation at
/// the store, never a read followed by a separate write.
#[async_trait]
pub trait RecordStore: Send + Sync + fmt::Debug {
    /// Insert a new record and its ticket together.
    async fn create_upload(
        &self,
        record: AssetRecord,
        ticket: UploadTicket,
    ) -> Result<(), RecordError>;

    /// Load a record.
    async fn get_asset(&self, id: &AssetId) -> Result<Option<AssetRecord>, RecordError>;

    /// Atomically apply `change` if the stored version equals
    /// `expected_version`. Returns the updated record.
    async fn apply_change(
        &self,
        id: &AssetId,
        expected_version: u64,
        change: RecordChange,
        now: DateTime<Utc>,
    ) -> Result<AssetRecord, RecordError>;

    /// Atomically move an `uploading` record to `corrupt`, storing `sha256`
    /// if given. Records in any other state are left alone and `None` is
    /// returned.
    async fn mark_corrupt(
        &self,
        id: &AssetId,
        sha256: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<AssetRecord>, RecordError>;

    /// Remove a record together with its ticket and share edges.
    async fn remove_asset(&self, id: &AssetId) -> Result<Option<AssetRecord>, RecordError>;

    /// Atomically flip the ticket's `used` flag from `false` to `true`.
    async fn consume_ticket(&self, id: &AssetId) -> Result<TicketConsumption, RecordError>;

    /// Ids of unused tickets that expired at or before `now`.
    async fn expired_tickets(&self, now: DateTime<Utc>) -> Result<Vec<AssetId>, RecordError>;

    /// The share edge for `(id, user)`, if any.
    async fn get_share(
        &self,
        id: &AssetId,
        user: &UserId,
    ) -> Result<Option<AssetShare>, RecordError>;

    /// All share edges of an asset.
    async fn list_shares(&self, id: &AssetId) -> Result<Vec<AssetShare>, RecordError>;

    /// Page through `owner`'s records, newest first.
    async fn list_owned(&self, owner: &UserId, query: &ListQuery)
    -> Result<AssetPage, RecordError>;

    /// Resolve a user by email.
    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<UserId>, RecordError>;

    /// Append a download audit row.
    async fn append_download_audit(&self, audit: DownloadAudit) -> Result<(), RecordError>;
}
