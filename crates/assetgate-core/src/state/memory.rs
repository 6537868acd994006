//! `DashMap`-backed record store.
//!
//! Conditional writes hold the record's shard lock for the whole
//! check-and-write, which makes them atomic with respect to each other.
//! Lock order is always assets, then tickets or shares.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parking_lot::Mutex;
use tracing::{debug, trace};

use assetgate_model::types::{AssetId, AssetStatus, UserId};

use super::asset::{AssetRecord, RecordChange};
use super::share::{AssetShare, DownloadAudit};
use super::store::{AssetPage, ListQuery, RecordError, RecordStore, TicketConsumption};
use super::ticket::UploadTicket;

/// In-memory [`RecordStore`].
#[derive(Debug, Default)]
pub struct InMemoryRecordStore {
    assets: DashMap<AssetId, AssetRecord>,
    tickets: DashMap<AssetId, UploadTicket>,
    shares: DashMap<(AssetId, UserId), AssetShare>,
    users: DashMap<String, UserId>,
    audits: Mutex<Vec<DownloadAudit>>,
}

impl InMemoryRecordStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user directory entry. Emails are matched case-insensitively.
    pub fn register_user(&self, email: &str, user_id: UserId) {
        trace!(email, %user_id, "registering user");
        self.users.insert(normalize_email(email), user_id);
    }

    /// Load `email=user_id` pairs separated by commas. Malformed entries
    /// are skipped. Returns how many were registered.
    pub fn register_users(&self, spec: &str) -> usize {
        spec.split(',')
            .filter_map(|entry| {
                let (email, user) = entry.split_once('=')?;
                let (email, user) = (email.trim(), user.trim());
                (!email.is_empty() && !user.is_empty()).then_some((email, user))
            })
            .map(|(email, user)| self.register_user(email, UserId::new(user)))
            .count()
    }

    /// Every audit row written so far.
    #[must_use]
    pub fn download_audits(&self) -> Vec<DownloadAudit> {
        self.audits.lock().clone()
    }

    /// The stored ticket for an asset, if any.
    #[must_use]
    pub fn ticket(&self, id: &AssetId) -> Option<UploadTicket> {
        self.tickets.get(id).map(|t| t.value().clone())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create_upload(
        &self,
        record: AssetRecord,
        ticket: UploadTicket,
    ) -> Result<(), RecordError> {
        match self.assets.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(RecordError::AlreadyExists(record.id)),
            Entry::Vacant(slot) => {
                self.tickets.insert(ticket.asset_id.clone(), ticket);
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get_asset(&self, id: &AssetId) -> Result<Option<AssetRecord>, RecordError> {
        Ok(self.assets.get(id).map(|r| r.value().clone()))
    }

    async fn apply_change(
        &self,
        id: &AssetId,
        expected_version: u64,
        change: RecordChange,
        now: DateTime<Utc>,
    ) -> Result<AssetRecord, RecordError> {
        let mut record = self
            .assets
            .get_mut(id)
            .ok_or_else(|| RecordError::NotFound(id.clone()))?;

        if record.version != expected_version {
            return Err(RecordError::VersionMismatch {
                asset_id: id.clone(),
                expected: expected_version,
                actual: record.version,
            });
        }

        match &change {
            RecordChange::UpsertShare {
                grantee,
                can_download,
            } => {
                self.shares
                    .entry((id.clone(), grantee.clone()))
                    .and_modify(|share| share.can_download = *can_download)
                    .or_insert_with(|| AssetShare {
                        asset_id: id.clone(),
                        grantee_id: grantee.clone(),
                        can_download: *can_download,
                        created_at: now,
                    });
            }
            RecordChange::RemoveShare { grantee } => {
                self.shares.remove(&(id.clone(), grantee.clone()));
            }
            RecordChange::MarkReady { .. } | RecordChange::Rename { .. } | RecordChange::Claim => {}
        }

        change.apply_to(&mut record, now);
        debug!(asset_id = %id, version = record.version, change = change.kind(), "applied record change");
        Ok(record.clone())
    }

    async fn mark_corrupt(
        &self,
        id: &AssetId,
        sha256: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Option<AssetRecord>, RecordError> {
        let Some(mut record) = self.assets.get_mut(id) else {
            return Ok(None);
        };
        if record.status != AssetStatus::Uploading {
            return Ok(None);
        }
        record.status = AssetStatus::Corrupt;
        if sha256.is_some() {
            record.sha256 = sha256;
        }
        record.updated_at = now;
        debug!(asset_id = %id, "marked asset corrupt");
        Ok(Some(record.clone()))
    }

    async fn remove_asset(&self, id: &AssetId) -> Result<Option<AssetRecord>, RecordError> {
        let removed = self.assets.remove(id).map(|(_, record)| record);
        if removed.is_some() {
            self.tickets.remove(id);
            self.shares.retain(|(asset_id, _), _| asset_id != id);
        }
        Ok(removed)
    }

    async fn consume_ticket(&self, id: &AssetId) -> Result<TicketConsumption, RecordError> {
        let Some(mut ticket) = self.tickets.get_mut(id) else {
            return Ok(TicketConsumption::Missing);
        };
        if ticket.used {
            return Ok(TicketConsumption::AlreadyUsed);
        }
        let before = ticket.clone();
        ticket.used = true;
        Ok(TicketConsumption::Consumed(before))
    }

    async fn expired_tickets(&self, now: DateTime<Utc>) -> Result<Vec<AssetId>, RecordError> {
        Ok(self
            .tickets
            .iter()
            .filter(|t| !t.used && t.is_expired(now))
            .map(|t| t.asset_id.clone())
            .collect())
    }

    async fn get_share(
        &self,
        id: &AssetId,
        user: &UserId,
    ) -> Result<Option<AssetShare>, RecordError> {
        Ok(self
            .shares
            .get(&(id.clone(), user.clone()))
            .map(|s| s.value().clone()))
    }

    async fn list_shares(&self, id: &AssetId) -> Result<Vec<AssetShare>, RecordError> {
        let mut shares: Vec<AssetShare> = self
            .shares
            .iter()
            .filter(|s| &s.asset_id == id)
            .map(|s| s.value().clone())
            .collect();
        shares.sort_by(|a, b| a.grantee_id.cmp(&b.grantee_id));
        Ok(shares)
    }

    async fn list_owned(
        &self,
        owner: &UserId,
        query: &ListQuery,
    ) -> Result<AssetPage, RecordError> {
        let cursor_key = match &query.after {
            Some(after) => {
                let cursor = self
                    .assets
                    .get(after)
                    .filter(|r| r.is_owned_by(owner))
                    .ok_or_else(|| RecordError::InvalidCursor(after.to_string()))?;
                Some((cursor.created_at, cursor.id.clone()))
            }
            None => None,
        };
        let needle = query
            .filter_name_lowercase()
            .filter(|n| !n.is_empty());

        let mut items: Vec<AssetRecord> = self
            .assets
            .iter()
            .filter(|r| r.is_owned_by(owner))
            .filter(|r| query.status.is_none_or(|s| r.status == s))
            .filter(|r| {
                needle
                    .as_deref()
                    .is_none_or(|n| r.filename.to_lowercase().contains(n))
            })
            .filter(|r| {
                cursor_key
                    .as_ref()
                    .is_none_or(|key| (r.created_at, r.id.clone()) < *key)
            })
            .map(|r| r.value().clone())
            .collect();

        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        let has_next_page = items.len() > query.limit;
        items.truncate(query.limit);
        Ok(AssetPage {
            items,
            has_next_page,
        })
    }

    async fn lookup_user_by_email(&self, email: &str) -> Result<Option<UserId>, RecordError> {
        Ok(self
            .users
            .get(&normalize_email(email))
            .map(|u| u.value().clone()))
    }

    async fn append_download_audit(&self, audit: DownloadAudit) -> Result<(), RecordError> {
        self.audits.lock().push(audit);
        Ok(())
    }
}

impl ListQuery {
    fn filter_name_lowercase(&self) -> Option<String> {
        self.filename_contains
            .as_deref()
            .map(|n| n.trim().to_lowercase())
    }
}
