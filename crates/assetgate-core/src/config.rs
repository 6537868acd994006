//! AssetGate configuration.
//!
//! Provides [`AssetGateConfig`]. Values are loaded from environment
//! variables with development-friendly defaults.

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Media types accepted when no `ALLOWED_MIME_TYPES` is set.
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "application/pdf",
    "text/plain",
];

/// AssetGate service configuration.
///
/// # Examples
///
/// ```
/// use assetgate_core::config::AssetGateConfig;
///
/// let config = AssetGateConfig::default();
/// assert_eq!(config.gateway_listen, "0.0.0.0:4000");
/// assert_eq!(config.upload_ticket_ttl_secs, 7200);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetGateConfig {
    /// Bind address for the gateway.
    #[builder(default = String::from("0.0.0.0:4000"))]
    pub gateway_listen: String,

    /// Externally reachable base URL used when minting storage URLs.
    #[builder(default = String::from("http://localhost:4000"))]
    pub public_base_url: String,

    /// Bucket holding every asset.
    #[builder(default = String::from("private"))]
    pub storage_bucket: String,

    /// HMAC secret for storage URLs.
    #[serde(skip_serializing)]
    #[builder(default = String::from("assetgate-dev-secret"))]
    pub storage_signing_secret: String,

    /// Base URL of a remote identity service, if any.
    #[builder(default)]
    pub identity_endpoint: Option<String>,

    /// API key sent to the remote identity service.
    #[serde(skip_serializing)]
    #[builder(default)]
    pub identity_api_key: Option<String>,

    /// Static `token=user` pairs for development.
    #[serde(skip_serializing)]
    #[builder(default)]
    pub identity_static_tokens: String,

    /// Static `email=user` pairs seeding the user directory.
    #[builder(default)]
    pub user_directory: String,

    /// Whether a bare `x-user-id` header identifies the caller.
    #[builder(default = false)]
    pub allow_identity_header: bool,

    /// Media types accepted at ticket issuance.
    #[builder(default = default_mime_types())]
    pub allowed_mime_types: Vec<String>,

    /// Lifetime of upload tickets and upload URLs.
    #[builder(default = 7200)]
    pub upload_ticket_ttl_secs: u64,

    /// Lifetime of download URLs.
    #[builder(default = 90)]
    pub download_url_ttl_secs: u64,

    /// Number of leading bytes inspected by content sniffing.
    #[builder(default = 128)]
    pub sniff_prefix_len: usize,

    /// Object size kept in memory before spilling to a temp file.
    #[builder(default = 524_288)]
    pub max_memory_object_size: usize,

    /// Seconds between expired-ticket sweeps; `0` disables the reaper.
    #[builder(default = 0)]
    pub reaper_interval_secs: u64,

    /// Page size when `first` is omitted.
    #[builder(default = 50)]
    pub default_page_size: u32,

    /// Upper bound on `first`.
    #[builder(default = 200)]
    pub max_page_size: u32,

    /// Log level filter string.
    #[builder(default = String::from("info"))]
    pub log_level: String,
}

fn default_mime_types() -> Vec<String> {
    DEFAULT_ALLOWED_MIME_TYPES
        .iter()
        .map(|s| (*s).to_owned())
        .collect()
}

impl Default for AssetGateConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl AssetGateConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `GATEWAY_LISTEN` | `0.0.0.0:4000` |
    /// | `PUBLIC_BASE_URL` | `http://localhost:4000` |
    /// | `STORAGE_BUCKET` | `private` |
    /// | `STORAGE_SIGNING_SECRET` | `assetgate-dev-secret` |
    /// | `IDENTITY_ENDPOINT` | unset |
    /// | `IDENTITY_API_KEY` | unset |
    /// | `IDENTITY_STATIC_TOKENS` | empty |
    /// | `USER_DIRECTORY` | empty |
    /// | `ALLOW_IDENTITY_HEADER` | `false` |
    /// | `ALLOWED_MIME_TYPES` | `image/jpeg,image/png,image/webp,application/pdf,text/plain` |
    /// | `UPLOAD_TICKET_TTL_SECS` | `7200` |
    /// | `DOWNLOAD_URL_TTL_SECS` | `90` |
    /// | `SNIFF_PREFIX_LEN` | `128` |
    /// | `MAX_MEMORY_OBJECT_SIZE` | `524288` |
    /// | `REAPER_INTERVAL_SECS` | `0` |
    /// | `DEFAULT_PAGE_SIZE` | `50` |
    /// | `MAX_PAGE_SIZE` | `200` |
    /// | `LOG_LEVEL` | `info` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(v) = lookup("GATEWAY_LISTEN") {
            config.gateway_listen = v;
        }
        if let Some(v) = lookup("PUBLIC_BASE_URL") {
            config.public_base_url = v;
        }
        if let Some(v) = lookup("STORAGE_BUCKET") {
            config.storage_bucket = v;
        }
        if let Some(v) = lookup("STORAGE_SIGNING_SECRET") {
            config.storage_signing_secret = v;
        }
        if let Some(v) = lookup("IDENTITY_ENDPOINT").filter(|v| !v.is_empty()) {
            config.identity_endpoint = Some(v);
        }
        if let Some(v) = lookup("IDENTITY_API_KEY").filter(|v| !v.is_empty()) {
            config.identity_api_key = Some(v);
        }
        if let Some(v) = lookup("IDENTITY_STATIC_TOKENS") {
            config.identity_static_tokens = v;
        }
        if let Some(v) = lookup("USER_DIRECTORY") {
            config.user_directory = v;
        }
        if let Some(v) = lookup("ALLOW_IDENTITY_HEADER") {
            config.allow_identity_header = parse_bool(&v);
        }
        if let Some(v) = lookup("ALLOWED_MIME_TYPES") {
            let types: Vec<String> = v
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !types.is_empty() {
                config.allowed_mime_types = types;
            }
        }
        parse_into(&lookup, "UPLOAD_TICKET_TTL_SECS", &mut config.upload_ticket_ttl_secs);
        parse_into(&lookup, "DOWNLOAD_URL_TTL_SECS", &mut config.download_url_ttl_secs);
        parse_into(&lookup, "SNIFF_PREFIX_LEN", &mut config.sniff_prefix_len);
        parse_into(&lookup, "MAX_MEMORY_OBJECT_SIZE", &mut config.max_memory_object_size);
        parse_into(&lookup, "REAPER_INTERVAL_SECS", &mut config.reaper_interval_secs);
        parse_into(&lookup, "DEFAULT_PAGE_SIZE", &mut config.default_page_size);
        parse_into(&lookup, "MAX_PAGE_SIZE", &mut config.max_page_size);
        if let Some(v) = lookup("LOG_LEVEL") {
            config.log_level = v;
        }

        config
    }

    /// Whether `mime` is on the allow-list. Comparison ignores ASCII case.
    #[must_use]
    pub fn is_mime_allowed(&self, mime: &str) -> bool {
        self.allowed_mime_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime))
    }
}

fn parse_into<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    slot: &mut T,
) {
    if let Some(n) = lookup(key).and_then(|v| v.trim().parse::<T>().ok()) {
        *slot = n;
    }
}

/// Parse a string as a boolean, accepting `"1"` and `"true"` (case-insensitive).
fn parse_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
