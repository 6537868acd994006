//! AssetGate RPC service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;

use assetgate_auth::{AuthError, IdentityProvider, resolve_caller};
use assetgate_model::error::AssetError;
use assetgate_model::types::Caller;

use crate::body::AssetResponseBody;
use crate::dispatch::{AssetHandler, dispatch_operation};
use crate::response::{CONTENT_TYPE, REQUEST_ID_HEADER, error_to_response};
use crate::router::resolve_operation;

/// Configuration for the AssetGate HTTP service.
#[derive(Clone, Default)]
pub struct AssetGateHttpConfig {
    /// Whether a bare `x-user-id` header is trusted as the caller identity.
    pub allow_identity_header: bool,
    /// Provider used to resolve bearer tokens.
    pub identity_provider: Option<Arc<dyn IdentityProvider>>,
}

impl std::fmt::Debug for AssetGateHttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetGateHttpConfig")
            .field("allow_identity_header", &self.allow_identity_header)
            .field(
                "identity_provider",
                &self.identity_provider.as_ref().map(|_| "..."),
            )
            .finish()
    }
}

/// Hyper `Service` implementation for the AssetGate RPC surface.
#[derive(Debug)]
pub struct AssetGateHttpService<H: AssetHandler> {
    handler: Arc<H>,
    config: Arc<AssetGateHttpConfig>,
}

impl<H: AssetHandler> AssetGateHttpService<H> {
    /// Create a new `AssetGateHttpService`.
    pub fn new(handler: Arc<H>, config: AssetGateHttpConfig) -> Self {
        Self {
            handler,
            config: Arc::new(config),
        }
    }
}

impl<H: AssetHandler> Clone for AssetGateHttpService<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H: AssetHandler> hyper::service::Service<http::Request<Incoming>> for AssetGateHttpService<H> {
    type Response = http::Response<AssetResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<Incoming>) -> Self::Future {
        let handler = Arc::clone(&self.handler);
        let config = Arc::clone(&self.config);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let response = process_request(req, handler.as_ref(), &config, &request_id).await;
            Ok(add_common_headers(response, &request_id))
        })
    }
}

/// Process a single RPC request through the full pipeline.
pub async fn process_request<H, B>(
    req: http::Request<B>,
    handler: &H,
    config: &AssetGateHttpConfig,
    request_id: &str,
) -> http::Response<AssetResponseBody>
where
    H: AssetHandler,
    B: http_body::Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    let (parts, incoming) = req.into_parts();

    // 1. Only POST carries RPC calls.
    if parts.method != http::Method::POST {
        let err = AssetError::bad_request(format!(
            "AssetGate requires POST method, got {}",
            parts.method,
        ));
        return error_to_response(&err, request_id);
    }

    // 2. Route on the target header.
    let op = match resolve_operation(&parts.headers) {
        Ok(op) => op,
        Err(err) => return error_to_response(&err, request_id),
    };

    // 3. Authenticate before reading the body.
    let caller = match authenticate(&parts.headers, config).await {
        Ok(caller) => caller,
        Err(err) => return error_to_response(&err, request_id),
    };

    // 4. Collect body.
    let body = match collect_body(incoming).await {
        Ok(body) => body,
        Err(err) => return error_to_response(&err, request_id),
    };

    // 5. Dispatch to handler.
    match dispatch_operation(handler, op, caller, body).await {
        Ok(response) => response,
        Err(err) => {
            tracing::debug!(request_id, operation = %op, code = %err.code(), "operation failed");
            error_to_response(&err, request_id)
        }
    }
}

async fn authenticate(
    headers: &http::HeaderMap,
    config: &AssetGateHttpConfig,
) -> Result<Caller, AssetError> {
    let provider = config.identity_provider.as_deref();
    match resolve_caller(headers, provider, config.allow_identity_header).await {
        Ok(user_id) => Ok(Caller::new(user_id)),
        Err(AuthError::Provider(reason)) => {
            tracing::warn!(reason, "identity provider unavailable");
            Err(AssetError::unauthenticated("identity provider unavailable"))
        }
        Err(err) => Err(AssetError::unauthenticated(err.to_string())),
    }
}

/// Collect the incoming body into a single `Bytes` buffer.
pub(crate) async fn collect_body<B>(incoming: B) -> Result<Bytes, AssetError>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: std::fmt::Display,
{
    incoming
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| AssetError::bad_request(format!("Failed to read request body: {e}")))
}

/// Add common response headers to every response.
pub(crate) fn add_common_headers(
    mut response: http::Response<AssetResponseBody>,
    request_id: &str,
) -> http::Response<AssetResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.entry(REQUEST_ID_HEADER).or_insert(hv);
    }

    headers
        .entry("content-type")
        .or_insert(http::HeaderValue::from_static(CONTENT_TYPE));

    headers.insert("server", http::HeaderValue::from_static("AssetGate"));

    response
}
