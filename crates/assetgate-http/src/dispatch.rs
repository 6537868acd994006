//! Handler traits and operation dispatch.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use assetgate_model::error::AssetError;
use assetgate_model::operations::AssetOperation;
use assetgate_model::types::Caller;

use crate::body::AssetResponseBody;

/// Boxed future returned by handler traits.
pub type HandlerFuture<T> = Pin<Box<dyn Future<Output = Result<T, AssetError>> + Send>>;

/// Trait that the AssetGate business logic provider must implement.
///
/// The handler receives the parsed operation, the authenticated caller and
/// the raw JSON body, and returns a complete HTTP response.
pub trait AssetHandler: Send + Sync + 'static {
    /// Handle an operation and produce an HTTP response.
    fn handle_operation(
        &self,
        op: AssetOperation,
        caller: Caller,
        body: Bytes,
    ) -> HandlerFuture<http::Response<AssetResponseBody>>;
}

/// Trait for the byte store behind the signed storage data plane.
///
/// Signatures are verified before either method is called.
pub trait StorageHandler: Send + Sync + 'static {
    /// Store `body` at `bucket`/`path`.
    ///
    /// Objects are write-once. A path that already holds bytes is reported
    /// as [`AssetError::ObjectExists`].
    fn put_object(&self, bucket: String, path: String, body: Bytes) -> HandlerFuture<()>;

    /// Read the object at `bucket`/`path`.
    ///
    /// A missing object is reported as [`AssetError::NotFoundOnStorage`].
    fn get_object(&self, bucket: String, path: String) -> HandlerFuture<Bytes>;
}

/// Dispatch an operation to the handler.
pub async fn dispatch_operation<H: AssetHandler>(
    handler: &H,
    op: AssetOperation,
    caller: Caller,
    body: Bytes,
) -> Result<http::Response<AssetResponseBody>, AssetError> {
    tracing::debug!(operation = %op, user_id = %caller.user_id, "dispatching AssetGate operation");
    handler.handle_operation(op, caller, body).await
}
