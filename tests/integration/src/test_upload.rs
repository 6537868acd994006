//! Upload and finalize flows against a running server.

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{RpcClient, sha256_hex};

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_finalize_verified_upload() {
        let client = RpcClient::fresh("alice");
        let ticket = client.upload("notes.txt", "text/plain", b"hello world").await.unwrap();

        let resp = client
            .call(
                "FinalizeUpload",
                &json!({
                    "assetId": ticket["assetId"],
                    "clientSha256": sha256_hex(b"hello world"),
                    "version": 1,
                }),
            )
            .await
            .unwrap();
        assert!(resp.status.is_success(), "{}", resp.body);
        assert_eq!(resp.body["status"], "ready");
        assert_eq!(resp.body["version"], 2);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_upload_url_replay_after_finalize() {
        let client = RpcClient::fresh("alice");
        let ticket = client.upload("notes.txt", "text/plain", b"hello world").await.unwrap();
        let resp = client
            .call(
                "FinalizeUpload",
                &json!({
                    "assetId": ticket["assetId"],
                    "clientSha256": sha256_hex(b"hello world"),
                    "version": 1,
                }),
            )
            .await
            .unwrap();
        assert_eq!(resp.body["status"], "ready");

        let url = ticket["uploadUrl"].as_str().unwrap();
        let replay = client
            .http()
            .put(url)
            .body("<script>evil</script>")
            .send()
            .await
            .unwrap();
        assert_eq!(replay.status(), reqwest::StatusCode::CONFLICT);

        let link = client
            .call("GetDownloadUrl", &json!({ "assetId": ticket["assetId"] }))
            .await
            .unwrap();
        let bytes = client
            .http()
            .get(link.body["url"].as_str().unwrap())
            .send()
            .await
            .unwrap()
            .bytes()
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"hello world");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_fake_hash_and_mark_corrupt() {
        let client = RpcClient::fresh("alice");
        let ticket = client.upload("notes.txt", "text/plain", b"hello world").await.unwrap();
        let asset_id = ticket["assetId"].clone();

        let resp = client
            .call(
                "FinalizeUpload",
                &json!({
                    "assetId": asset_id,
                    "clientSha256": "0".repeat(64),
                    "version": 1,
                }),
            )
            .await
            .unwrap();
        assert_eq!(resp.error_code(), Some("INTEGRITY_ERROR"));

        let asset = client
            .call("GetAsset", &json!({ "assetId": asset_id }))
            .await
            .unwrap();
        assert_eq!(asset.body["status"], "corrupt");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_content_that_does_not_match_declared_type() {
        let client = RpcClient::fresh("alice");
        let ticket = client.upload("scan.pdf", "application/pdf", PNG).await.unwrap();

        let resp = client
            .call(
                "FinalizeUpload",
                &json!({
                    "assetId": ticket["assetId"],
                    "clientSha256": sha256_hex(PNG),
                    "version": 1,
                }),
            )
            .await
            .unwrap();
        assert_eq!(resp.error_code(), Some("BAD_REQUEST"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_refuse_disallowed_mime() {
        let client = RpcClient::fresh("alice");
        let resp = client
            .call(
                "CreateUploadUrl",
                &json!({ "filename": "x.html", "mime": "text/html", "size": 1 }),
            )
            .await
            .unwrap();
        assert_eq!(resp.error_code(), Some("BAD_REQUEST"));
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_reject_unsigned_storage_write() {
        let client = RpcClient::fresh("alice");
        let ticket = client.upload("notes.txt", "text/plain", b"abc").await.unwrap();
        let url = ticket["uploadUrl"].as_str().unwrap();
        let tampered = url.replace("signature=", "signature=00");

        let put = client.http().put(tampered).body("evil").send().await.unwrap();
        assert!(put.status().is_client_error());
    }
}
