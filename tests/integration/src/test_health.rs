//! Gateway health endpoint.

#[cfg(test)]
mod tests {
    use crate::endpoint_url;

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_report_running() {
        let body: serde_json::Value = reqwest::get(format!("{}/health", endpoint_url()))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["services"]["assetgate"], "running");
    }
}
