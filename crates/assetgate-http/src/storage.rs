//! Signed storage data plane.
//!
//! Clients upload and download bytes with the URLs minted by the RPC
//! surface:
//!
//! ```text
//! PUT /storage/<bucket>/<path>?expires=<unix>&signature=<hex>
//! GET /storage/<bucket>/<path>?expires=<unix>&signature=<hex>
//! ```
//!
//! The signature is checked before the backing [`StorageHandler`] is
//! touched. Objects are write-once: a `PUT` to a path that already holds
//! bytes answers `409 Conflict`.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use hyper::body::Incoming;

use assetgate_auth::presigned::{STORAGE_PREFIX, UrlSigner, decode_path};
use assetgate_model::error::{AssetError, AssetErrorCode};

use crate::body::AssetResponseBody;
use crate::dispatch::StorageHandler;
use crate::response::{error_response, error_to_response};
use crate::service::{add_common_headers, collect_body};

/// Hyper `Service` for signed object reads and writes.
#[derive(Debug)]
pub struct StorageHttpService<S: StorageHandler> {
    handler: Arc<S>,
    signer: Arc<UrlSigner>,
}

impl<S: StorageHandler> StorageHttpService<S> {
    /// Create a new `StorageHttpService`.
    pub fn new(handler: Arc<S>, signer: UrlSigner) -> Self {
        Self {
            handler,
            signer: Arc::new(signer),
        }
    }
}

impl<S: StorageHandler> Clone for StorageHttpService<S> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            signer: Arc::clone(&self.signer),
        }
    }
}

impl<S: StorageHandler> hyper::service::Service<http::Request<Incoming>> for StorageHttpService<S> {
    type Response = http::Response<AssetResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let signer = Arc::clone(&self.signer);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let response = process_storage_request(req, handler.as_ref(), &signer, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Whether `path` belongs to the storage data plane.
#[must_use]
pub fn is_storage_path(path: &str) -> bool {
    path.strip_prefix(STORAGE_PREFIX)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Split `/storage/<bucket>/<path>` into decoded bucket and object path.
fn split_storage_path(raw: &str) -> Option<(String, String)> {
    let rest = raw.strip_prefix(STORAGE_PREFIX)?.strip_prefix('/')?;
    let (bucket, path) = rest.split_once('/')?;
    let (bucket, path) = (decode_path(bucket), decode_path(path));
    (!bucket.is_empty() && !path.is_empty()).then_some((bucket, path))
}

/// Process a single data-plane request.
pub async fn process_storage_request<S, B>(
    req: http::Request<B>,
    handler: &S,
    signer: &UrlSigner,
    request_id: &str,
) -> http::Response<AssetResponseBody>
where
    S: StorageHandler,
    B: http_body::Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let (parts, incoming) = req.into_parts();

    let Some((bucket, path)) = split_storage_path(parts.uri.path()) else {
        return error_to_response(
            &AssetError::bad_request("Expected /storage/<bucket>/<path>"),
            request_id,
        );
    };

    if parts.method != http::Method::PUT && parts.method != http::Method::GET {
        return error_response(
            http::StatusCode::METHOD_NOT_ALLOWED,
            AssetErrorCode::BadRequest,
            &format!("Method {} not allowed on storage", parts.method),
            request_id,
        );
    }

    let query = parts.uri.query().unwrap_or("");
    if let Err(err) = signer.verify(&parts.method, &bucket, &path, query, Utc::now()) {
        tracing::debug!(request_id, bucket, path, error = %err, "rejected storage request");
        return error_response(
            http::StatusCode::FORBIDDEN,
            AssetErrorCode::Forbidden,
            &err.to_string(),
            request_id,
        );
    }

    if parts.method == http::Method::PUT {
        let body = match collect_body(incoming).await {
            Ok(body) => body,
            Err(err) => return error_to_response(&err, request_id),
        };
        let size = body.len();
        return match handler.put_object(bucket.clone(), path.clone(), body).await {
            Ok(()) => {
                tracing::debug!(request_id, bucket, path, size, "stored object");
                http::Response::builder()
                    .status(http::StatusCode::OK)
                    .body(AssetResponseBody::empty())
                    .expect("valid put response")
            }
            Err(err) => error_to_response(&err, request_id),
        };
    }

    match handler.get_object(bucket, path).await {
        Ok(data) => http::Response::builder()
            .status(http::StatusCode::OK)
            .header("content-type", "application/octet-stream")
            .header("content-length", data.len())
            .body(AssetResponseBody::from_bytes(data))
            .expect("valid get response"),
        Err(AssetError::NotFoundOnStorage { path }) => error_response(
            http::StatusCode::NOT_FOUND,
            AssetErrorCode::NotFoundOnStorage,
            &format!("Object not found: {path}"),
            request_id,
        ),
        Err(err) => error_to_response(&err, request_id),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use chrono::Duration;
    use http_body_util::{BodyExt, Full};

    use super::*;
    use crate::dispatch::HandlerFuture;

    #[derive(Debug, Default)]
    struct MemStore(Mutex<HashMap<String, Bytes>>);

    impl StorageHandler for MemStore {
        fn put_object(&self, bucket: String, path: String, body: Bytes) -> HandlerFuture<()> {
            let mut objects = self.0.lock().unwrap();
            let key = format!("{bucket}/{path}");
            let result = if objects.contains_key(&key) {
                Err(AssetError::ObjectExists { path })
            } else {
                objects.insert(key, body);
                Ok(())
            };
            Box::pin(async move { result })
        }

        fn get_object(&self, bucket: String, path: String) -> HandlerFuture<Bytes> {
            let found = self.0.lock().unwrap().get(&format!("{bucket}/{path}")).cloned();
            Box::pin(async move { found.ok_or(AssetError::NotFoundOnStorage { path }) })
        }
    }

    fn signed(signer: &UrlSigner, method: &http::Method, path: &str, ttl: i64) -> String {
        signer.sign_url("", method, "private", path, Utc::now() + Duration::seconds(ttl))
    }

    fn req(method: http::Method, uri: &str, body: &'static [u8]) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Full::new(Bytes::from_static(body)))
            .unwrap()
    }

    #[tokio::test]
    async fn test_should_put_then_get_with_signed_urls() {
        let store = MemStore::default();
        let signer = UrlSigner::new("k");
        let put = signed(&signer, &http::Method::PUT, "u1/a b.txt", 60);
        let resp =
            process_storage_request(req(http::Method::PUT, &put, b"hi"), &store, &signer, "r").await;
        assert_eq!(resp.status(), http::StatusCode::OK);

        let get = signed(&signer, &http::Method::GET, "u1/a b.txt", 60);
        let resp =
            process_storage_request(req(http::Method::GET, &get, b""), &store, &signer, "r").await;
        assert_eq!(resp.status(), http::StatusCode::OK);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"hi");
        assert!(store.0.lock().unwrap().contains_key("private/u1/a b.txt"));
    }

    #[tokio::test]
    async fn test_should_answer_conflict_when_object_exists() {
        let store = MemStore::default();
        let signer = UrlSigner::new("k");
        let put = signed(&signer, &http::Method::PUT, "u1/a.png", 60);
        let first =
            process_storage_request(req(http::Method::PUT, &put, b"one"), &store, &signer, "r").await;
        assert_eq!(first.status(), http::StatusCode::OK);

        let again =
            process_storage_request(req(http::Method::PUT, &put, b"two"), &store, &signer, "r").await;
        assert_eq!(again.status(), http::StatusCode::CONFLICT);
        let json: serde_json::Value =
            serde_json::from_slice(&again.into_body().collect().await.unwrap().to_bytes()).unwrap();
        assert_eq!(json["code"], "NOT_FOUND_OR_USED");
        assert_eq!(
            store.0.lock().unwrap().get("private/u1/a.png").map(|b| &b[..]),
            Some(&b"one"[..])
        );
    }

    #[tokio::test]
    async fn test_should_reject_get_url_used_for_put() {
        let store = MemStore::default();
        let signer = UrlSigner::new("k");
        let get = signed(&signer, &http::Method::GET, "x", 60);
        let resp =
            process_storage_request(req(http::Method::PUT, &get, b"x"), &store, &signer, "r").await;
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
        assert!(store.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_should_reject_expired_url() {
        let store = MemStore::default();
        let signer = UrlSigner::new("k");
        let put = signed(&signer, &http::Method::PUT, "x", -5);
        let resp =
            process_storage_request(req(http::Method::PUT, &put, b"x"), &store, &signer, "r").await;
        assert_eq!(resp.status(), http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_should_report_missing_object() {
        let store = MemStore::default();
        let signer = UrlSigner::new("k");
        let get = signed(&signer, &http::Method::GET, "missing", 60);
        let resp =
            process_storage_request(req(http::Method::GET, &get, b""), &store, &signer, "r").await;
        assert_eq!(resp.status(), http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_should_split_storage_path() {
        assert_eq!(
            split_storage_path("/storage/private/a/b%20c.png"),
            Some(("private".to_owned(), "a/b c.png".to_owned()))
        );
        assert!(split_storage_path("/storage/private").is_none());
        assert!(is_storage_path("/storage/x/y"));
        assert!(!is_storage_path("/storagex/y"));
    }
}
