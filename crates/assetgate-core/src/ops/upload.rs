//! Upload protocol handlers.

use chrono::Utc;

use assetgate_model::error::AssetResult;
use assetgate_model::input::{CreateUploadUrlInput, FinalizeUploadInput};
use assetgate_model::output::CreateUploadUrlOutput;
use assetgate_model::types::{AssetView, Caller};

use crate::provider::AssetGateProvider;

impl AssetGateProvider {
    /// Issue an upload ticket and a signed upload URL.
    pub async fn handle_create_upload_url(
        &self,
        caller: &Caller,
        input: CreateUploadUrlInput,
    ) -> AssetResult<CreateUploadUrlOutput> {
        self.tickets
            .issue(
                &caller.user_id,
                &input.filename,
                &input.mime,
                input.size,
                Utc::now(),
            )
            .await
    }

    /// Verify the uploaded bytes and promote the asset.
    pub async fn handle_finalize_upload(
        &self,
        caller: &Caller,
        input: FinalizeUploadInput,
    ) -> AssetResult<AssetView> {
        let record = self
            .finalize
            .run(&caller.user_id, &input, Utc::now())
            .await?;
        Ok(record.view())
    }
}
