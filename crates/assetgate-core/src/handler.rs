//! Handlers bridging the HTTP layer to the provider and the object store.

use std::sync::Arc;

use bytes::Bytes;

use assetgate_http::body::AssetResponseBody;
use assetgate_http::dispatch::{AssetHandler, HandlerFuture, StorageHandler};
use assetgate_http::response::json_response;
use assetgate_model::error::AssetError;
use assetgate_model::operations::AssetOperation;
use assetgate_model::types::Caller;

use crate::provider::AssetGateProvider;
use crate::storage::InMemoryObjectStore;

/// Handler that bridges the RPC service to [`AssetGateProvider`].
#[derive(Debug)]
pub struct AssetGateHandler {
    provider: Arc<AssetGateProvider>,
}

impl AssetGateHandler {
    /// Create a new handler wrapping a provider.
    #[must_use]
    pub fn new(provider: Arc<AssetGateProvider>) -> Self {
        Self { provider }
    }
}

impl AssetHandler for AssetGateHandler {
    fn handle_operation(
        &self,
        op: AssetOperation,
        caller: Caller,
        body: Bytes,
    ) -> HandlerFuture<http::Response<AssetResponseBody>> {
        let provider = Arc::clone(&self.provider);
        Box::pin(async move { dispatch(&provider, op, &caller, &body).await })
    }
}

/// Dispatch an operation to the matching provider method.
async fn dispatch(
    provider: &AssetGateProvider,
    op: AssetOperation,
    caller: &Caller,
    body: &[u8],
) -> Result<http::Response<AssetResponseBody>, AssetError> {
    match op {
        AssetOperation::CreateUploadUrl => {
            let output = provider
                .handle_create_upload_url(caller, deserialize(body)?)
                .await?;
            json_response(&output)
        }
        AssetOperation::FinalizeUpload => {
            let output = provider
                .handle_finalize_upload(caller, deserialize(body)?)
                .await?;
            json_response(&output)
        }
        AssetOperation::RenameAsset => {
            let output = provider.handle_rename_asset(caller, deserialize(body)?).await?;
            json_response(&output)
        }
        AssetOperation::ShareAsset => {
            let output = provider.handle_share_asset(caller, deserialize(body)?).await?;
            json_response(&output)
        }
        AssetOperation::RevokeShare => {
            let output = provider.handle_revoke_share(caller, deserialize(body)?).await?;
            json_response(&output)
        }
        AssetOperation::DeleteAsset => {
            let output = provider.handle_delete_asset(caller, deserialize(body)?).await?;
            json_response(&output)
        }
        AssetOperation::GetDownloadUrl => {
            let output = provider
                .handle_get_download_url(caller, deserialize(body)?)
                .await?;
            json_response(&output)
        }
        AssetOperation::GetAsset => {
            let output = provider.handle_get_asset(caller, deserialize(body)?).await?;
            json_response(&output)
        }
        AssetOperation::MyAssets => {
            let output = provider.handle_my_assets(caller, deserialize_or_default(body)?).await?;
            json_response(&output)
        }
    }
}

/// Deserialize a JSON request body into the input type.
fn deserialize<T: serde::de::DeserializeOwned>(body: &[u8]) -> Result<T, AssetError> {
    serde_json::from_slice(body)
        .map_err(|e| AssetError::bad_request(format!("Failed to deserialize request body: {e}")))
}

/// Like [`deserialize`], but an empty body yields the default input.
fn deserialize_or_default<T: serde::de::DeserializeOwned + Default>(
    body: &[u8],
) -> Result<T, AssetError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        Ok(T::default())
    } else {
        deserialize(body)
    }
}

/// Serves the `/storage/...` data plane from an [`InMemoryObjectStore`].
#[derive(Debug)]
pub struct ObjectStoreHandler {
    store: Arc<InMemoryObjectStore>,
}

impl ObjectStoreHandler {
    /// Create a handler over `store`.
    #[must_use]
    pub fn new(store: Arc<InMemoryObjectStore>) -> Self {
        Self { store }
    }
}

impl StorageHandler for ObjectStoreHandler {
    fn put_object(&self, bucket: String, path: String, body: Bytes) -> HandlerFuture<()> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            store
                .create_object(&bucket, &path, body)
                .await
                .map(|_| ())
                .map_err(AssetError::from)
        })
    }

    fn get_object(&self, bucket: String, path: String) -> HandlerFuture<Bytes> {
        let store = Arc::clone(&self.store);
        Box::pin(async move {
            store
                .read_object(&bucket, &path)
                .await
                .map_err(AssetError::from)
        })
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::{BodyExt, Full};

    use assetgate_auth::UrlSigner;
    use assetgate_http::storage::process_storage_request;

    use super::*;
    use crate::checksums::compute_sha256;
    use crate::ops::testing::provider;
    use crate::storage::ObjectStore;

    async fn call(
        handler: &AssetGateHandler,
        op: AssetOperation,
        caller: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, AssetError> {
        let resp = handler
            .handle_operation(op, Caller::new(caller), Bytes::from(body.to_string()))
            .await?;
        assert_eq!(resp.status(), http::StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        Ok(serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_should_drive_upload_protocol_through_handlers() {
        let (provider, objects) = provider();
        let handler = AssetGateHandler::new(Arc::new(provider));
        let storage = ObjectStoreHandler::new(objects);

        let ticket = call(
            &handler,
            AssetOperation::CreateUploadUrl,
            "alice",
            serde_json::json!({"filename": "test.txt", "mime": "text/plain", "size": 10}),
        )
        .await
        .unwrap();
        let path = ticket["storagePath"].as_str().unwrap().to_owned();
        storage
            .put_object("private".into(), path.clone(), Bytes::from_static(b"0123456789"))
            .await
            .unwrap();
        assert_eq!(
            storage.get_object("private".into(), path).await.unwrap().as_ref(),
            b"0123456789"
        );

        let view = call(
            &handler,
            AssetOperation::FinalizeUpload,
            "alice",
            serde_json::json!({
                "assetId": ticket["assetId"],
                "clientSha256": compute_sha256(b"0123456789"),
                "version": 1,
            }),
        )
        .await
        .unwrap();
        assert_eq!(view["status"], "ready");
        assert_eq!(view["version"], 2);

        let page = call(&handler, AssetOperation::MyAssets, "alice", serde_json::json!({}))
            .await
            .unwrap();
        assert_eq!(page["edges"].as_array().unwrap().len(), 1);
        assert_eq!(page["pageInfo"]["hasNextPage"], false);
    }

    #[tokio::test]
    async fn test_should_refuse_upload_url_replay_after_finalize() {
        let (provider, objects) = provider();
        let base_url = provider.config().public_base_url.clone();
        let signer = UrlSigner::new(&provider.config().storage_signing_secret);
        let handler = AssetGateHandler::new(Arc::new(provider));
        let storage = ObjectStoreHandler::new(Arc::clone(&objects));

        let ticket = call(
            &handler,
            AssetOperation::CreateUploadUrl,
            "alice",
            serde_json::json!({"filename": "test.txt", "mime": "text/plain", "size": 10}),
        )
        .await
        .unwrap();
        let uri = ticket["uploadUrl"]
            .as_str()
            .unwrap()
            .strip_prefix(base_url.as_str())
            .unwrap()
            .to_owned();
        let put = |body: &'static [u8]| {
            http::Request::builder()
                .method(http::Method::PUT)
                .uri(uri.as_str())
                .body(Full::new(Bytes::from_static(body)))
                .unwrap()
        };

        let first = process_storage_request(put(b"0123456789"), &storage, &signer, "r1").await;
        assert_eq!(first.status(), http::StatusCode::OK);
        let view = call(
            &handler,
            AssetOperation::FinalizeUpload,
            "alice",
            serde_json::json!({
                "assetId": ticket["assetId"],
                "clientSha256": compute_sha256(b"0123456789"),
                "version": 1,
            }),
        )
        .await
        .unwrap();
        assert_eq!(view["status"], "ready");

        let replay =
            process_storage_request(put(b"<script>evil</script>"), &storage, &signer, "r2").await;
        assert_eq!(replay.status(), http::StatusCode::CONFLICT);

        let path = ticket["storagePath"].as_str().unwrap();
        let stored = objects.download(path).await.unwrap();
        assert_eq!(stored.as_ref(), b"0123456789");
        assert_eq!(view["sha256"], compute_sha256(&stored));
    }

    #[tokio::test]
    async fn test_should_reject_malformed_body() {
        let (provider, _) = provider();
        let handler = AssetGateHandler::new(Arc::new(provider));
        let err = handler
            .handle_operation(
                AssetOperation::RenameAsset,
                Caller::new("alice"),
                Bytes::from_static(b"{\"assetId\": 1}"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_should_accept_empty_listing_body() {
        let (provider, _) = provider();
        let handler = AssetGateHandler::new(Arc::new(provider));
        let resp = handler
            .handle_operation(AssetOperation::MyAssets, Caller::new("alice"), Bytes::new())
            .await
            .unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
    }

    #[tokio::test]
    async fn test_should_report_missing_object_on_storage() {
        let (_, objects) = provider();
        let storage = ObjectStoreHandler::new(objects);
        let err = storage
            .get_object("private".into(), "nope".into())
            .await
            .unwrap_err();
        assert!(matches!(err, AssetError::NotFoundOnStorage { .. }));
    }
}
