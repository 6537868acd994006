//! Response serialization and error formatting.

use serde::Serialize;

use assetgate_model::error::{AssetError, AssetErrorCode};

use crate::body::AssetResponseBody;

/// Content type for AssetGate JSON responses.
pub const CONTENT_TYPE: &str = "application/json";

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Serialize an error body.
///
/// ```json
/// { "code": "VERSION_CONFLICT", "message": "Version conflict on asset ..." }
/// ```
#[must_use]
pub fn error_json(code: AssetErrorCode, message: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "code": code.as_str(),
        "message": message,
    }))
    .expect("JSON serialization of error cannot fail")
}

/// Build an error response with an explicit status.
#[must_use]
pub fn error_response(
    status: http::StatusCode,
    code: AssetErrorCode,
    message: &str,
    request_id: &str,
) -> http::Response<AssetResponseBody> {
    http::Response::builder()
        .status(status)
        .header("content-type", CONTENT_TYPE)
        .header(REQUEST_ID_HEADER, request_id)
        .body(AssetResponseBody::from_bytes(error_json(code, message)))
        .expect("valid error response")
}

/// Convert an `AssetError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &AssetError, request_id: &str) -> http::Response<AssetResponseBody> {
    if let AssetError::Internal(source) = error {
        tracing::error!(request_id, error = ?source, "internal error");
    }
    error_response(
        error.status_code(),
        error.code(),
        &error.client_message(),
        request_id,
    )
}

/// Build a success response by serializing `value` as JSON.
pub fn json_response<T: Serialize>(
    value: &T,
) -> Result<http::Response<AssetResponseBody>, AssetError> {
    let json = serde_json::to_vec(value).map_err(|e| AssetError::Internal(anyhow::Error::new(e)))?;
    Ok(http::Response::builder()
        .status(http::StatusCode::OK)
        .header("content-type", CONTENT_TYPE)
        .body(AssetResponseBody::from_bytes(json))
        .expect("valid JSON response"))
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;

    use super::*;

    async fn body_json(resp: http::Response<AssetResponseBody>) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_should_format_error_json() {
        let err = AssetError::VersionConflict {
            asset_id: "a1".into(),
            expected: 1,
            actual: 2,
        };
        let resp = error_to_response(&err, "req-1");
        assert_eq!(resp.status(), http::StatusCode::CONFLICT);
        assert_eq!(resp.headers().get(REQUEST_ID_HEADER).unwrap(), "req-1");
        let json = body_json(resp).await;
        assert_eq!(json["code"], "VERSION_CONFLICT");
        assert!(json["message"].as_str().unwrap().contains("a1"));
    }

    #[tokio::test]
    async fn test_should_mask_internal_errors() {
        let err = AssetError::Internal(anyhow::anyhow!("secret detail"));
        let resp = error_to_response(&err, "req-2");
        assert_eq!(resp.status(), http::StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(resp).await;
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert_eq!(json["message"], "Internal server error");
    }

    #[tokio::test]
    async fn test_should_build_json_success_response() {
        let resp = json_response(&serde_json::json!({"deleted": true})).unwrap();
        assert_eq!(resp.status(), http::StatusCode::OK);
        assert_eq!(resp.headers().get("content-type").unwrap(), CONTENT_TYPE);
        assert_eq!(body_json(resp).await["deleted"], true);
    }
}
