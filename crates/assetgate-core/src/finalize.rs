//! The finalize pipeline.
//!
//! Promotes an `uploading` asset to `ready`, or leaves it `corrupt`, after
//! checking what actually landed in storage. Each stage is a hard gate:
//!
//! 1. guard: record exists, caller owns it, version matches
//! 2. ticket: consume the upload ticket exactly once
//! 3. retrieval: download the bytes at the ticket's storage path
//! 4. type: sniff the leading bytes and compare with the ticket's media type
//! 5. integrity: compare the SHA-256 of the bytes with the client digest
//! 6. commit: conditional write to `ready` at the caller's version
//!
//! Failures after stage 2 persist `corrupt` before returning, so the
//! outcome is visible on the next read. The ticket is spent by then, which
//! makes every later finalize fail `NOT_FOUND_OR_USED`.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use assetgate_model::error::{AssetError, AssetResult};
use assetgate_model::input::FinalizeUploadInput;
use assetgate_model::types::{AssetId, UserId};

use crate::checksums::{compute_sha256, digests_match, normalize_hex_digest};
use crate::guard::MutationGuard;
use crate::sniff::sniff;
use crate::state::{AssetRecord, RecordChange, RecordError, RecordStore};
use crate::storage::{ObjectStore, StorageError};
use crate::tickets::TicketStore;

/// Runs finalize against the record and object stores.
#[derive(Debug, Clone)]
pub struct FinalizePipeline {
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    tickets: TicketStore,
    sniff_prefix_len: usize,
}

impl FinalizePipeline {
    /// Create a pipeline. `sniff_prefix_len` bytes are handed to the sniffer.
    #[must_use]
    pub fn new(
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        tickets: TicketStore,
        sniff_prefix_len: usize,
    ) -> Self {
        Self {
            records,
            objects,
            tickets,
            sniff_prefix_len,
        }
    }

    /// Run every stage for `input` on behalf of `user`.
    pub async fn run(
        &self,
        user: &UserId,
        input: &FinalizeUploadInput,
        now: DateTime<Utc>,
    ) -> AssetResult<AssetRecord> {
        let id = &input.asset_id;
        let client_sha256 = normalize_hex_digest(&input.client_sha256).ok_or_else(|| {
            AssetError::bad_request("clientSha256 must be 64 hexadecimal characters")
        })?;

        MutationGuard::new(self.records.as_ref())
            .check(id, user, input.version)
            .await?;

        let ticket = self.tickets.consume(id).await?;
        debug!(asset_id = %id, "consumed upload ticket");

        if ticket.is_expired(now) {
            self.mark_corrupt(id, None, now).await;
            return Err(AssetError::NotFoundOrUsed {
                asset_id: id.to_string(),
                reason: "expired",
            });
        }

        let data = match self.objects.download(&ticket.storage_path).await {
            Ok(data) => data,
            Err(e) => {
                if let StorageError::Internal(source) = &e {
                    warn!(asset_id = %id, error = %source, "object download failed");
                }
                self.mark_corrupt(id, None, now).await;
                return Err(AssetError::NotFoundOnStorage {
                    path: ticket.storage_path,
                });
            }
        };

        let digest = compute_sha256(&data);
        let prefix = &data[..data.len().min(self.sniff_prefix_len)];
        let sniffed = sniff(prefix);
        if !sniffed.is_some_and(|t| t.matches_declared(&ticket.mime)) {
            self.mark_corrupt(id, Some(digest), now).await;
            return Err(AssetError::MimeMismatch {
                declared: ticket.mime,
                sniffed: sniffed.map(|t| t.mime().to_owned()),
            });
        }

        if !digests_match(&client_sha256, &digest) {
            self.mark_corrupt(id, Some(digest.clone()), now).await;
            return Err(AssetError::IntegrityError {
                expected: client_sha256,
                actual: digest,
            });
        }

        let change = RecordChange::MarkReady {
            sha256: digest.clone(),
        };
        match self.records.apply_change(id, input.version, change, now).await {
            Ok(record) => {
                info!(asset_id = %id, version = record.version, size = data.len(), "asset finalized");
                Ok(record)
            }
            Err(RecordError::VersionMismatch {
                expected, actual, ..
            }) => {
                self.mark_corrupt(id, Some(digest), now).await;
                Err(AssetError::VersionConflict {
                    asset_id: id.to_string(),
                    expected,
                    actual,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn mark_corrupt(&self, id: &AssetId, sha256: Option<String>, now: DateTime<Utc>) {
        match self.records.mark_corrupt(id, sha256, now).await {
            Ok(Some(_)) => info!(asset_id = %id, "asset marked corrupt"),
            Ok(None) => debug!(asset_id = %id, "asset no longer uploading, left as is"),
            Err(e) => error!(asset_id = %id, error = %e, "failed to persist corrupt status"),
        }
    }
}
