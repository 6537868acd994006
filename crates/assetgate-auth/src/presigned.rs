//! HMAC-signed storage URLs.
//!
//! A signed URL has the form
//! `<base>/storage/<bucket>/<path>?expires=<unix>&signature=<hex>`. The
//! signature is HMAC-SHA256 over
//!
//! ```text
//! <METHOD>\n/<bucket>/<path>\n<expires>
//! ```
//!
//! keyed with the server's signing secret. The path is signed in decoded
//! form; the URL carries it percent-encoded segment by segment.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::error::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// Path prefix under which the storage data plane is mounted.
pub const STORAGE_PREFIX: &str = "/storage";

/// Characters left unescaped in a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Signs and verifies storage URLs with a shared secret.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner").finish_non_exhaustive()
    }
}

impl UrlSigner {
    /// Create a signer with the given secret.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Compute the hex signature for a request.
    #[must_use]
    pub fn signature(&self, method: &http::Method, bucket: &str, path: &str, expires: i64) -> String {
        let string_to_sign = format!("{}\n/{bucket}/{path}\n{expires}", method.as_str());
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can accept keys of any length");
        mac.update(string_to_sign.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Build a signed URL valid until `expires_at`.
    ///
    /// # Examples
    ///
    /// ```
    /// use assetgate_auth::presigned::UrlSigner;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let signer = UrlSigner::new("secret");
    /// let expires = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    /// let url = signer.sign_url("http://localhost:4000", &http::Method::GET, "private", "a b.txt", expires);
    /// assert!(url.starts_with("http://localhost:4000/storage/private/a%20b.txt?expires=1700000000&signature="));
    /// ```
    #[must_use]
    pub fn sign_url(
        &self,
        base_url: &str,
        method: &http::Method,
        bucket: &str,
        path: &str,
        expires_at: DateTime<Utc>,
    ) -> String {
        let expires = expires_at.timestamp();
        let signature = self.signature(method, bucket, path, expires);
        format!(
            "{}{STORAGE_PREFIX}/{}/{}?expires={expires}&signature={signature}",
            base_url.trim_end_matches('/'),
            encode_path(bucket),
            encode_path(path),
        )
    }

    /// Verify a signed request against `now`.
    ///
    /// `bucket` and `path` must already be percent-decoded; `query` is the raw
    /// query string.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::MissingQueryParam`] if `expires` or `signature` is
    /// absent or malformed, [`AuthError::RequestExpired`] past the expiry, and
    /// [`AuthError::SignatureDoesNotMatch`] for a bad signature.
    pub fn verify(
        &self,
        method: &http::Method,
        bucket: &str,
        path: &str,
        query: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AuthError> {
        let params = parse_query(query);
        let expires: i64 = get_required_param(&params, "expires")?
            .parse()
            .map_err(|_| AuthError::MissingQueryParam("expires (invalid format)".to_owned()))?;
        let provided = get_required_param(&params, "signature")?;

        if now.timestamp() > expires {
            debug!(bucket, path, expires, "Signed URL expired");
            return Err(AuthError::RequestExpired);
        }

        let expected = self.signature(method, bucket, path, expires);
        if provided.as_bytes().ct_eq(expected.as_bytes()).into() {
            Ok(())
        } else {
            debug!(bucket, path, "Signed URL signature mismatch");
            Err(AuthError::SignatureDoesNotMatch)
        }
    }
}

/// Percent-encode each `/`-separated segment of `path`.
#[must_use]
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
        .collect::<Vec<_>>()
        .join("/")
}

/// Percent-decode a request path.
#[must_use]
pub fn decode_path(path: &str) -> String {
    percent_encoding::percent_decode_str(path)
        .decode_utf8_lossy()
        .into_owned()
}

fn parse_query(query: &str) -> HashMap<String, String> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_path(k), decode_path(v))
        })
        .collect()
}

fn get_required_param(params: &HashMap<String, String>, name: &str) -> Result<String, AuthError> {
    params
        .get(name)
        .cloned()
        .ok_or_else(|| AuthError::MissingQueryParam(name.to_owned()))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn split_url(url: &str) -> (String, String) {
        let rest = url.split_once(STORAGE_PREFIX).unwrap().1;
        let (path, query) = rest.split_once('?').unwrap();
        (decode_path(path), query.to_owned())
    }

    #[test]
    fn test_should_verify_freshly_signed_url() {
        let signer = UrlSigner::new("k");
        let now = Utc::now();
        let url = signer.sign_url(
            "http://h",
            &http::Method::PUT,
            "private",
            "private/u1/2026/01/id-a b.png",
            now + Duration::seconds(60),
        );
        let (path, query) = split_url(&url);
        assert_eq!(path, "/private/private/u1/2026/01/id-a b.png");
        signer
            .verify(
                &http::Method::PUT,
                "private",
                "private/u1/2026/01/id-a b.png",
                &query,
                now,
            )
            .unwrap();
    }

    #[test]
    fn test_should_reject_wrong_method() {
        let signer = UrlSigner::new("k");
        let now = Utc::now();
        let url = signer.sign_url("http://h", &http::Method::PUT, "b", "p", now + Duration::seconds(60));
        let (_, query) = split_url(&url);
        assert!(matches!(
            signer.verify(&http::Method::GET, "b", "p", &query, now),
            Err(AuthError::SignatureDoesNotMatch)
        ));
    }

    #[test]
    fn test_should_reject_expired_url() {
        let signer = UrlSigner::new("k");
        let now = Utc::now();
        let url = signer.sign_url("http://h", &http::Method::GET, "b", "p", now - Duration::seconds(1));
        let (_, query) = split_url(&url);
        assert!(matches!(
            signer.verify(&http::Method::GET, "b", "p", &query, now),
            Err(AuthError::RequestExpired)
        ));
    }

    #[test]
    fn test_should_reject_other_secret() {
        let now = Utc::now();
        let url = UrlSigner::new("a").sign_url(
            "http://h",
            &http::Method::GET,
            "b",
            "p",
            now + Duration::seconds(60),
        );
        let (_, query) = split_url(&url);
        assert!(matches!(
            UrlSigner::new("b").verify(&http::Method::GET, "b", "p", &query, now),
            Err(AuthError::SignatureDoesNotMatch)
        ));
    }

    #[test]
    fn test_should_require_query_params() {
        let signer = UrlSigner::new("k");
        assert!(matches!(
            signer.verify(&http::Method::GET, "b", "p", "expires=1", Utc::now()),
            Err(AuthError::MissingQueryParam(p)) if p == "signature"
        ));
    }

    #[test]
    fn test_should_encode_segments_but_keep_slashes() {
        assert_eq!(encode_path("a b/c#d"), "a%20b/c%23d");
    }
}
