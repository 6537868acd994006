//! AssetGate Server - verified direct-to-storage uploads.
//!
//! Hosts the RPC surface for upload tickets, finalization, sharing and
//! listing, together with the signed storage data plane the clients write
//! to and read from. A gateway layer splits the two by path.
//!
//! # Usage
//!
//! ```text
//! GATEWAY_LISTEN=0.0.0.0:4000 ALLOW_IDENTITY_HEADER=true assetgate-server
//! ```
//!
//! # Environment Variables
//!
//! See [`AssetGateConfig::from_env`] for the full table. The server itself
//! additionally reads:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |
//! | `LOG_FORMAT` | `text` | `json` switches to structured JSON logs |

mod gateway;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as HttpConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use assetgate_auth::{IdentityProvider, RemoteIdentityProvider, StaticIdentityProvider, UrlSigner};
use assetgate_core::{
    AssetGateConfig, AssetGateHandler, AssetGateProvider, ObjectStoreHandler, spawn_reaper,
};
use assetgate_http::{AssetGateHttpConfig, AssetGateHttpService, StorageHttpService};

use crate::gateway::GatewayService;

/// Server version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str, json: bool) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    Ok(())
}

/// Whether `LOG_FORMAT` asks for JSON output.
fn wants_json_logs(format: Option<&str>) -> bool {
    format.is_some_and(|f| f.trim().eq_ignore_ascii_case("json"))
}

/// Pick the identity provider for bearer tokens.
///
/// A remote endpoint wins over the static token table. Returns `None` when
/// neither is configured.
fn build_identity_provider(config: &AssetGateConfig) -> Option<Arc<dyn IdentityProvider>> {
    if let Some(endpoint) = &config.identity_endpoint {
        info!(endpoint = %endpoint, "using remote identity provider");
        return Some(Arc::new(RemoteIdentityProvider::new(
            endpoint.clone(),
            config.identity_api_key.clone(),
        )));
    }

    let provider = StaticIdentityProvider::parse(&config.identity_static_tokens);
    if provider.is_empty() {
        return None;
    }
    info!(tokens = provider.len(), "using static identity provider");
    Some(Arc::new(provider))
}

/// Build the [`AssetGateHttpConfig`] from the [`AssetGateConfig`].
fn build_http_config(config: &AssetGateConfig) -> AssetGateHttpConfig {
    AssetGateHttpConfig {
        allow_identity_header: config.allow_identity_header,
        identity_provider: build_identity_provider(config),
    }
}

/// Run the accept loop, serving connections until a shutdown signal is received.
async fn serve(listener: TcpListener, service: GatewayService) -> Result<()> {
    let graceful = hyper_util::server::graceful::GracefulShutdown::new();
    let http = HttpConnBuilder::new(TokioExecutor::new());

    let shutdown = async {
        tokio::signal::ctrl_c().await.ok();
        info!("received shutdown signal, draining connections");
    };

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = listener.accept() => {
                let (stream, peer_addr) = match result {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "failed to accept connection");
                        continue;
                    }
                };

                let svc = service.clone();
                let conn = http.serve_connection(TokioIo::new(stream), svc);
                let conn = graceful.watch(conn.into_owned());

                tokio::spawn(async move {
                    if let Err(e) = conn.await {
                        error!(peer_addr = %peer_addr, error = %e, "connection error");
                    }
                });
            }

            () = &mut shutdown => {
                info!("shutting down gracefully");
                break;
            }
        }
    }

    graceful.shutdown().await;
    info!("all connections drained, exiting");

    Ok(())
}

/// Perform a health check by connecting to the gateway and requesting `/health`.
async fn run_health_check(addr: &str) -> Result<()> {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    let stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("cannot connect to {addr}"))?;

    let (mut reader, mut writer) = stream.into_split();

    let request = format!("GET /health HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    writer.write_all(request.as_bytes()).await?;
    writer.shutdown().await?;

    let mut response = String::new();
    reader.read_to_string(&mut response).await?;

    if response.contains("200 OK") && response.contains("\"running\"") {
        Ok(())
    } else {
        anyhow::bail!("unhealthy response from {addr}")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AssetGateConfig::from_env();

    // Handle --health-check flag for container HEALTHCHECK.
    if std::env::args().any(|a| a == "--health-check") {
        let addr = config.gateway_listen.replace("0.0.0.0", "127.0.0.1");
        let healthy = run_health_check(&addr).await.is_ok();
        std::process::exit(i32::from(!healthy));
    }

    let json = wants_json_logs(std::env::var("LOG_FORMAT").ok().as_deref());
    init_tracing(&config.log_level, json)?;

    if config.allow_identity_header {
        warn!("x-user-id header is trusted as caller identity; do not enable in production");
    }

    let addr: SocketAddr = config
        .gateway_listen
        .parse()
        .with_context(|| format!("invalid bind address: {}", config.gateway_listen))?;

    let http_config = build_http_config(&config);
    let signer = UrlSigner::new(&config.storage_signing_secret);
    let reaper_interval = config.reaper_interval_secs;

    info!(
        bucket = %config.storage_bucket,
        public_base_url = %config.public_base_url,
        allowed_mime_types = ?config.allowed_mime_types,
        "initializing AssetGate",
    );
    let (provider, objects) = AssetGateProvider::in_memory(config);
    let provider = Arc::new(provider);

    if reaper_interval > 0 {
        info!(interval_secs = reaper_interval, "starting upload ticket reaper");
        spawn_reaper(Arc::clone(&provider), Duration::from_secs(reaper_interval));
    }

    let rpc = AssetGateHttpService::new(Arc::new(AssetGateHandler::new(provider)), http_config);
    let storage = StorageHttpService::new(Arc::new(ObjectStoreHandler::new(objects)), signer);
    let gateway = GatewayService::new(rpc, storage);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(%addr, version = VERSION, "starting AssetGate Server");

    serve(listener, gateway).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_detect_json_log_format() {
        assert!(wants_json_logs(Some("json")));
        assert!(wants_json_logs(Some(" JSON ")));
        assert!(!wants_json_logs(Some("text")));
        assert!(!wants_json_logs(None));
    }

    #[test]
    fn test_should_skip_identity_provider_when_unconfigured() {
        let config = AssetGateConfig::default();
        assert!(build_identity_provider(&config).is_none());
    }

    #[tokio::test]
    async fn test_should_build_static_identity_provider_from_tokens() {
        let config = AssetGateConfig::builder()
            .identity_static_tokens("tok=alice".to_owned())
            .build();
        let provider = build_identity_provider(&config).unwrap();
        assert_eq!(provider.resolve_bearer("tok").await.unwrap(), "alice");
    }

    #[test]
    fn test_should_prefer_remote_identity_provider() {
        let config = AssetGateConfig::builder()
            .identity_endpoint(Some("http://auth.local".to_owned()))
            .identity_static_tokens("tok=alice".to_owned())
            .build();
        let provider = build_identity_provider(&config).unwrap();
        assert!(format!("{provider:?}").contains("RemoteIdentityProvider"));
    }

    #[test]
    fn test_should_carry_identity_header_flag_into_http_config() {
        let config = AssetGateConfig::builder().allow_identity_header(true).build();
        let http_config = build_http_config(&config);
        assert!(http_config.allow_identity_header);
        assert!(http_config.identity_provider.is_none());
    }
}
