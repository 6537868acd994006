//! Upload ticket issuance and single-use consumption.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use assetgate_model::error::{AssetError, AssetResult};
use assetgate_model::output::CreateUploadUrlOutput;
use assetgate_model::types::{AssetId, UserId};

use crate::config::AssetGateConfig;
use crate::state::{AssetRecord, RecordStore, TicketConsumption, UploadTicket};
use crate::storage::ObjectStore;
use crate::utils::{build_storage_path, generate_asset_id, generate_nonce, sanitize_filename};

/// Issues upload tickets and consumes them exactly once.
#[derive(Debug, Clone)]
pub struct TicketStore {
    records: Arc<dyn RecordStore>,
    objects: Arc<dyn ObjectStore>,
    config: Arc<AssetGateConfig>,
}

impl TicketStore {
    /// Create a ticket store over the given collaborators.
    #[must_use]
    pub fn new(
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
        config: Arc<AssetGateConfig>,
    ) -> Self {
        Self {
            records,
            objects,
            config,
        }
    }

    /// Create an `uploading` record with its ticket and mint the upload URL.
    ///
    /// The media type is checked against the allow-list before anything is
    /// written. If minting the upload URL fails, the record is removed again
    /// and the storage error is returned.
    pub async fn issue(
        &self,
        owner: &UserId,
        filename: &str,
        mime: &str,
        size: u64,
        now: DateTime<Utc>,
    ) -> AssetResult<CreateUploadUrlOutput> {
        let mime = media_type_essence(mime);
        if !self.config.is_mime_allowed(&mime) {
            return Err(AssetError::DisallowedMime { mime });
        }

        let id = generate_asset_id();
        let safe_name = sanitize_filename(filename);
        let storage_path = build_storage_path(owner, &id, &safe_name, now);
        let ttl = i64::try_from(self.config.upload_ticket_ttl_secs).unwrap_or(i64::MAX);
        let expires_at = now + Duration::seconds(ttl);
        let nonce = generate_nonce();

        let record = AssetRecord::new_uploading(
            id.clone(),
            owner.clone(),
            safe_name,
            mime.clone(),
            size,
            storage_path.clone(),
            now,
        );
        let ticket = UploadTicket {
            asset_id: id.clone(),
            user_id: owner.clone(),
            nonce: nonce.clone(),
            mime,
            size,
            storage_path: storage_path.clone(),
            expires_at,
            used: false,
        };
        self.records.create_upload(record, ticket).await?;

        let upload_url = match self.objects.create_upload_url(&storage_path, expires_at).await {
            Ok(url) => url,
            Err(e) => {
                warn!(asset_id = %id, error = %e, "upload URL issuance failed, rolling back record");
                if let Err(rollback) = self.records.remove_asset(&id).await {
                    warn!(asset_id = %id, error = %rollback, "rollback of uploading record failed");
                }
                return Err(e.into());
            }
        };

        info!(asset_id = %id, owner = %owner, storage_path, "issued upload ticket");
        Ok(CreateUploadUrlOutput {
            asset_id: id,
            storage_path,
            upload_url,
            expires_at,
            nonce,
        })
    }

    /// Atomically consume the ticket for `id`.
    ///
    /// Returns the ticket as it was before consumption. A ticket that was
    /// already consumed, or never issued, fails with
    /// [`AssetError::NotFoundOrUsed`].
    pub async fn consume(&self, id: &AssetId) -> AssetResult<UploadTicket> {
        match self.records.consume_ticket(id).await? {
            TicketConsumption::Consumed(ticket) => Ok(ticket),
            TicketConsumption::AlreadyUsed => Err(AssetError::NotFoundOrUsed {
                asset_id: id.to_string(),
                reason: "consumed",
            }),
            TicketConsumption::Missing => Err(AssetError::NotFoundOrUsed {
                asset_id: id.to_string(),
                reason: "missing",
            }),
        }
    }
}

/// Lowercased media type without parameters.
fn media_type_essence(mime: &str) -> String {
    mime.split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
