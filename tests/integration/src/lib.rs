//! Integration tests for AssetGate server.
//!
//! These tests require a running server at `localhost:4000` started with
//! the identity header enabled and a user directory that knows `bob`:
//!
//! ```text
//! ALLOW_IDENTITY_HEADER=true USER_DIRECTORY=bob@example.com=bob assetgate-server
//! ```
//!
//! They are marked `#[ignore]` so they don't run during normal `cargo test`.
//!
//! Run them with:
//! ```text
//! cargo test -p assetgate-integration -- --ignored
//! ```

use std::sync::Once;

use serde_json::Value;
use sha2::{Digest, Sha256};

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Endpoint URL for the server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("ASSETGATE_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:4000".to_owned())
}

/// A caller that talks to the RPC surface as a fixed user.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    endpoint: String,
    user_id: String,
}

/// Status and decoded JSON body of an RPC call.
#[derive(Debug)]
pub struct RpcResponse {
    /// HTTP status.
    pub status: reqwest::StatusCode,
    /// Decoded body.
    pub body: Value,
}

impl RpcResponse {
    /// The `code` field of an error body, if any.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.body.get("code").and_then(Value::as_str)
    }
}

impl RpcClient {
    /// Create a client acting as `user_id`.
    #[must_use]
    pub fn new(user_id: &str) -> Self {
        init_tracing();
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint_url(),
            user_id: user_id.to_owned(),
        }
    }

    /// Create a client acting as a fresh random user.
    #[must_use]
    pub fn fresh(prefix: &str) -> Self {
        let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
        Self::new(&format!("{prefix}-{id}"))
    }

    /// The underlying HTTP client, for data-plane requests.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Invoke `operation` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    pub async fn call(&self, operation: &str, body: &Value) -> anyhow::Result<RpcResponse> {
        let response = self
            .http
            .post(format!("{}/", self.endpoint))
            .header("x-assetgate-target", format!("AssetGate_v1.{operation}"))
            .header("x-user-id", &self.user_id)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let body = response.json().await?;
        tracing::debug!(operation, %status, "rpc call finished");
        Ok(RpcResponse { status, body })
    }

    /// Issue a ticket, PUT `bytes` to its upload URL, and return the ticket.
    ///
    /// # Errors
    ///
    /// Returns an error if any step fails.
    pub async fn upload(&self, filename: &str, mime: &str, bytes: &[u8]) -> anyhow::Result<Value> {
        let ticket = self
            .call(
                "CreateUploadUrl",
                &serde_json::json!({
                    "filename": filename,
                    "mime": mime,
                    "size": bytes.len(),
                }),
            )
            .await?;
        anyhow::ensure!(ticket.status.is_success(), "ticket refused: {}", ticket.body);

        let url = ticket.body["uploadUrl"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("no uploadUrl in {}", ticket.body))?;
        let put = self.http.put(url).body(bytes.to_vec()).send().await?;
        anyhow::ensure!(put.status().is_success(), "upload failed: {}", put.status());

        Ok(ticket.body)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

mod test_assets;
mod test_health;
mod test_upload;
