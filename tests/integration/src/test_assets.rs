//! Sharing, download and listing against a running server.

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{RpcClient, sha256_hex};

    async fn ready_asset(client: &RpcClient, name: &str, bytes: &[u8]) -> Value {
        let ticket = client.upload(name, "text/plain", bytes).await.unwrap();
        let resp = client
            .call(
                "FinalizeUpload",
                &json!({
                    "assetId": ticket["assetId"],
                    "clientSha256": sha256_hex(bytes),
                    "version": 1,
                }),
            )
            .await
            .unwrap();
        assert!(resp.status.is_success(), "{}", resp.body);
        resp.body
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_share_and_let_grantee_download() {
        let alice = RpcClient::fresh("alice");
        let bob = RpcClient::new("bob");
        let asset = ready_asset(&alice, "report.txt", b"quarterly numbers").await;

        let denied = bob
            .call("GetDownloadUrl", &json!({ "assetId": asset["id"] }))
            .await
            .unwrap();
        assert_eq!(denied.error_code(), Some("FORBIDDEN"));

        let shared = alice
            .call(
                "ShareAsset",
                &json!({
                    "assetId": asset["id"],
                    "toEmail": "bob@example.com",
                    "canDownload": true,
                    "version": asset["version"],
                }),
            )
            .await
            .unwrap();
        assert!(shared.status.is_success(), "{}", shared.body);
        assert_eq!(shared.body["version"], 3);

        let link = bob
            .call("GetDownloadUrl", &json!({ "assetId": asset["id"] }))
            .await
            .unwrap();
        let url = link.body["url"].as_str().unwrap();
        let bytes = bob.http().get(url).send().await.unwrap().bytes().await.unwrap();
        assert_eq!(&bytes[..], b"quarterly numbers");
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_upsert_share_without_duplicating() {
        let alice = RpcClient::fresh("alice");
        let asset = ready_asset(&alice, "a.txt", b"aaa").await;

        let mut version = asset["version"].as_u64().unwrap();
        for can_download in [false, true] {
            let resp = alice
                .call(
                    "ShareAsset",
                    &json!({
                        "assetId": asset["id"],
                        "toEmail": "bob@example.com",
                        "canDownload": can_download,
                        "version": version,
                    }),
                )
                .await
                .unwrap();
            assert!(resp.status.is_success(), "{}", resp.body);
            version = resp.body["version"].as_u64().unwrap();
        }

        let stale = alice
            .call(
                "RenameAsset",
                &json!({ "assetId": asset["id"], "filename": "b.txt", "version": 2 }),
            )
            .await
            .unwrap();
        assert_eq!(stale.error_code(), Some("VERSION_CONFLICT"));
        assert_eq!(version, 4);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_newest_first_with_cursor() {
        let alice = RpcClient::fresh("alice");
        for name in ["one.txt", "two.txt", "three.txt"] {
            ready_asset(&alice, name, name.as_bytes()).await;
        }

        let first = alice.call("MyAssets", &json!({ "first": 2 })).await.unwrap();
        let edges = first.body["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0]["node"]["filename"], "three.txt");
        assert_eq!(first.body["pageInfo"]["hasNextPage"], true);

        let cursor = first.body["pageInfo"]["endCursor"].clone();
        let second = alice
            .call("MyAssets", &json!({ "first": 2, "after": cursor }))
            .await
            .unwrap();
        let edges = second.body["edges"].as_array().unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0]["node"]["filename"], "one.txt");
        assert_eq!(second.body["pageInfo"]["hasNextPage"], false);
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_delete_asset_and_forget_it() {
        let alice = RpcClient::fresh("alice");
        let asset = ready_asset(&alice, "gone.txt", b"bye").await;

        let deleted = alice
            .call(
                "DeleteAsset",
                &json!({ "assetId": asset["id"], "version": asset["version"] }),
            )
            .await
            .unwrap();
        assert_eq!(deleted.body["deleted"], true);

        let missing = alice
            .call("GetAsset", &json!({ "assetId": asset["id"] }))
            .await
            .unwrap();
        assert_eq!(missing.error_code(), Some("NOT_FOUND"));
    }
}
