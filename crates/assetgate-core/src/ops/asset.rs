//! Asset record handlers: rename, delete, read and listing.

use chrono::Utc;
use tracing::{debug, info};

use assetgate_model::error::{AssetError, AssetResult};
use assetgate_model::input::{DeleteAssetInput, GetAssetInput, MyAssetsInput, RenameAssetInput};
use assetgate_model::output::{AssetEdge, DeleteAssetOutput, MyAssetsOutput, PageInfo};
use assetgate_model::types::{AssetId, AssetView, Caller};

use crate::guard::MutationGuard;
use crate::provider::AssetGateProvider;
use crate::state::{ListQuery, RecordChange};
use crate::utils::sanitize_filename;

impl AssetGateProvider {
    /// Replace the display name. The storage path keeps the original name.
    pub async fn handle_rename_asset(
        &self,
        caller: &Caller,
        input: RenameAssetInput,
    ) -> AssetResult<AssetView> {
        let filename = sanitize_filename(&input.filename);
        MutationGuard::new(self.records.as_ref())
            .check(&input.asset_id, &caller.user_id, input.version)
            .await?;

        let record = self
            .records
            .apply_change(
                &input.asset_id,
                input.version,
                RecordChange::Rename { filename },
                Utc::now(),
            )
            .await?;
        debug!(asset_id = %record.id, version = record.version, "renamed asset");
        Ok(record.view())
    }

    /// Delete the asset, its bytes, its ticket and its share edges.
    ///
    /// The record is first claimed with a version bump so a concurrent
    /// mutation at the same version loses. Storage is cleaned up before the
    /// record disappears.
    pub async fn handle_delete_asset(
        &self,
        caller: &Caller,
        input: DeleteAssetInput,
    ) -> AssetResult<DeleteAssetOutput> {
        MutationGuard::new(self.records.as_ref())
            .check(&input.asset_id, &caller.user_id, input.version)
            .await?;

        let claimed = self
            .records
            .apply_change(&input.asset_id, input.version, RecordChange::Claim, Utc::now())
            .await?;
        self.objects.delete(&claimed.storage_path).await?;
        self.records.remove_asset(&input.asset_id).await?;

        info!(asset_id = %input.asset_id, owner = %caller.user_id, "deleted asset");
        Ok(DeleteAssetOutput { deleted: true })
    }

    /// Read one asset. Allowed for the owner and for any share grantee.
    pub async fn handle_get_asset(
        &self,
        caller: &Caller,
        input: GetAssetInput,
    ) -> AssetResult<AssetView> {
        let record = self
            .records
            .get_asset(&input.asset_id)
            .await?
            .ok_or_else(|| AssetError::asset_not_found(&input.asset_id))?;

        if !record.is_owned_by(&caller.user_id)
            && self
                .records
                .get_share(&record.id, &caller.user_id)
                .await?
                .is_none()
        {
            return Err(AssetError::Forbidden {
                asset_id: record.id.to_string(),
                user_id: caller.user_id.to_string(),
            });
        }
        Ok(record.view())
    }

    /// Page through the caller's own assets, newest first.
    pub async fn handle_my_assets(
        &self,
        caller: &Caller,
        input: MyAssetsInput,
    ) -> AssetResult<MyAssetsOutput> {
        let max = self.config.max_page_size.max(1);
        let first = input
            .first
            .unwrap_or(self.config.default_page_size)
            .clamp(1, max);
        let query = ListQuery {
            after: input
                .after
                .filter(|c| !c.is_empty())
                .map(AssetId::new),
            limit: first as usize,
            status: input.status,
            filename_contains: input.q,
        };

        let page = self.records.list_owned(&caller.user_id, &query).await?;
        let edges: Vec<AssetEdge> = page
            .items
            .iter()
            .map(|record| AssetEdge {
                cursor: record.id.to_string(),
                node: record.view(),
            })
            .collect();
        let end_cursor = edges.last().map(|e| e.cursor.clone());

        Ok(MyAssetsOutput {
            edges,
            page_info: PageInfo {
                end_cursor,
                has_next_page: page.has_next_page,
            },
        })
    }
}
