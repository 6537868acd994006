//! Gateway service that routes requests to the RPC surface or the storage
//! data plane.
//!
//! Paths under `/storage/` go to the signed data plane; everything else is
//! an RPC call. Health-check endpoints are answered at the gateway level.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;

use hyper::body::Incoming;
use hyper::service::Service;

use assetgate_core::{AssetGateHandler, ObjectStoreHandler};
use assetgate_http::body::AssetResponseBody;
use assetgate_http::storage::is_storage_path;
use assetgate_http::{AssetGateHttpService, StorageHttpService};

/// Gateway in front of the RPC service and the storage data plane.
#[derive(Debug, Clone)]
pub struct GatewayService {
    rpc: AssetGateHttpService<AssetGateHandler>,
    storage: StorageHttpService<ObjectStoreHandler>,
}

impl GatewayService {
    /// Create a new gateway.
    pub fn new(
        rpc: AssetGateHttpService<AssetGateHandler>,
        storage: StorageHttpService<ObjectStoreHandler>,
    ) -> Self {
        Self { rpc, storage }
    }
}

impl Service<http::Request<Incoming>> for GatewayService {
    type Response = http::Response<AssetResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        if is_health_check(req.method(), req.uri().path()) {
            return Box::pin(async { Ok(health_check_response()) });
        }

        if is_storage_path(req.uri().path()) {
            let storage = self.storage.clone();
            return Box::pin(async move { storage.call(req).await });
        }

        let rpc = self.rpc.clone();
        Box::pin(async move { rpc.call(req).await })
    }
}

/// Check if the request is a health check probe.
fn is_health_check(method: &http::Method, path: &str) -> bool {
    *method == http::Method::GET && (path == "/health" || path == "/_health")
}

/// Produce the health check response.
fn health_check_response() -> http::Response<AssetResponseBody> {
    let body = r#"{"services":{"assetgate":"running"}}"#;
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(AssetResponseBody::from_string(body))
        .expect("static health response should be valid")
}
