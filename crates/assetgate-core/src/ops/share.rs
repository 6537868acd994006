//! Sharing and download handlers.

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use assetgate_model::error::{AssetError, AssetResult};
use assetgate_model::input::{GetDownloadUrlInput, RevokeShareInput, ShareAssetInput};
use assetgate_model::output::GetDownloadUrlOutput;
use assetgate_model::types::{AssetStatus, AssetView, Caller, UserId};

use crate::guard::MutationGuard;
use crate::provider::AssetGateProvider;
use crate::state::{DownloadAudit, RecordChange};

impl AssetGateProvider {
    /// Grant another user access, or update an existing grant.
    pub async fn handle_share_asset(
        &self,
        caller: &Caller,
        input: ShareAssetInput,
    ) -> AssetResult<AssetView> {
        MutationGuard::new(self.records.as_ref())
            .check(&input.asset_id, &caller.user_id, input.version)
            .await?;
        let grantee = self.resolve_user(&input.to_email).await?;
        if grantee == caller.user_id {
            return Err(AssetError::bad_request("Cannot share an asset with its owner"));
        }

        let record = self
            .records
            .apply_change(
                &input.asset_id,
                input.version,
                RecordChange::UpsertShare {
                    grantee: grantee.clone(),
                    can_download: input.can_download,
                },
                Utc::now(),
            )
            .await?;
        info!(asset_id = %record.id, %grantee, can_download = input.can_download, "shared asset");
        Ok(record.view())
    }

    /// Remove another user's access. Revoking a grant that does not exist
    /// still bumps the version.
    pub async fn handle_revoke_share(
        &self,
        caller: &Caller,
        input: RevokeShareInput,
    ) -> AssetResult<AssetView> {
        MutationGuard::new(self.records.as_ref())
            .check(&input.asset_id, &caller.user_id, input.version)
            .await?;
        let grantee = self.resolve_user(&input.to_email).await?;

        let record = self
            .records
            .apply_change(
                &input.asset_id,
                input.version,
                RecordChange::RemoveShare {
                    grantee: grantee.clone(),
                },
                Utc::now(),
            )
            .await?;
        info!(asset_id = %record.id, %grantee, "revoked share");
        Ok(record.view())
    }

    /// Issue a short-lived signed read URL and record the download.
    pub async fn handle_get_download_url(
        &self,
        caller: &Caller,
        input: GetDownloadUrlInput,
    ) -> AssetResult<GetDownloadUrlOutput> {
        let record = self
            .records
            .get_asset(&input.asset_id)
            .await?
            .ok_or_else(|| AssetError::asset_not_found(&input.asset_id))?;

        let forbidden = || AssetError::Forbidden {
            asset_id: record.id.to_string(),
            user_id: caller.user_id.to_string(),
        };
        if record.status != AssetStatus::Ready {
            debug!(asset_id = %record.id, status = %record.status, "download refused, asset not ready");
            return Err(forbidden());
        }
        if !record.is_owned_by(&caller.user_id) {
            let share = self.records.get_share(&record.id, &caller.user_id).await?;
            if !share.is_some_and(|s| s.can_download) {
                return Err(forbidden());
            }
        }

        let now = Utc::now();
        let ttl = i64::try_from(self.config.download_url_ttl_secs).unwrap_or(i64::MAX);
        let expires_at = now + Duration::seconds(ttl);
        let url = self
            .objects
            .create_download_url(&record.storage_path, expires_at)
            .await?;

        let audit = DownloadAudit {
            asset_id: record.id.clone(),
            user_id: caller.user_id.clone(),
            at: now,
        };
        if let Err(e) = self.records.append_download_audit(audit).await {
            warn!(asset_id = %record.id, user_id = %caller.user_id, error = %e, "failed to write download audit");
        }

        debug!(asset_id = %record.id, user_id = %caller.user_id, "issued download URL");
        Ok(GetDownloadUrlOutput { url, expires_at })
    }

    async fn resolve_user(&self, email: &str) -> AssetResult<UserId> {
        self.records
            .lookup_user_by_email(email)
            .await?
            .ok_or_else(|| AssetError::user_not_found(email))
    }
}
