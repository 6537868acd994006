//! Expired-ticket sweep.
//!
//! Uploads whose client never finalizes would otherwise stay `uploading`
//! forever. The reaper consumes every unused ticket past its expiry and
//! marks the asset `corrupt`. Consumption goes through the same atomic
//! flip as finalize, so a sweep and a late finalize never both win.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use assetgate_model::error::AssetResult;

use crate::provider::AssetGateProvider;
use crate::state::TicketConsumption;

impl AssetGateProvider {
    /// Expire unused tickets past their deadline. Returns how many assets
    /// were marked corrupt.
    pub async fn reap_expired_tickets(&self, now: DateTime<Utc>) -> AssetResult<usize> {
        let mut reaped = 0;
        for id in self.records.expired_tickets(now).await? {
            match self.records.consume_ticket(&id).await? {
                TicketConsumption::Consumed(_) => {
                    if self.records.mark_corrupt(&id, None, now).await?.is_some() {
                        reaped += 1;
                    }
                }
                TicketConsumption::AlreadyUsed | TicketConsumption::Missing => {
                    debug!(asset_id = %id, "ticket settled before sweep");
                }
            }
        }
        Ok(reaped)
    }
}

/// Run [`AssetGateProvider::reap_expired_tickets`] every `period` until the
/// task is aborted.
pub fn spawn_reaper(provider: Arc<AssetGateProvider>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match provider.reap_expired_tickets(Utc::now()).await {
                Ok(0) => {}
                Ok(n) => info!(reaped = n, "expired upload tickets reaped"),
                Err(e) => warn!(error = %e, "ticket sweep failed"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use assetgate_model::input::CreateUploadUrlInput;
    use assetgate_model::types::{AssetStatus, Caller};

    use super::*;
    use crate::ops::testing::{provider, ready_asset};

    #[tokio::test]
    async fn test_should_mark_expired_uploads_corrupt() {
        let (provider, objects) = provider();
        let alice = Caller::new("alice");
        let pending = provider
            .handle_create_upload_url(
                &alice,
                CreateUploadUrlInput {
                    filename: "late.png".into(),
                    mime: "image/png".into(),
                    size: 1,
                },
            )
            .await
            .unwrap();
        let done = ready_asset(&provider, &objects, &alice, "done.txt").await;

        assert_eq!(provider.reap_expired_tickets(Utc::now()).await.unwrap(), 0);

        let later = Utc::now() + ChronoDuration::hours(3);
        assert_eq!(provider.reap_expired_tickets(later).await.unwrap(), 1);
        assert_eq!(provider.reap_expired_tickets(later).await.unwrap(), 0);

        let pending = provider.records().get_asset(&pending.asset_id).await.unwrap().unwrap();
        assert_eq!(pending.status, AssetStatus::Corrupt);
        let done = provider.records().get_asset(&done.id).await.unwrap().unwrap();
        assert_eq!(done.status, AssetStatus::Ready);
    }

    #[tokio::test]
    async fn test_should_run_and_abort_background_sweep() {
        let (provider, _) = provider();
        let handle = spawn_reaper(Arc::new(provider), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
    }
}
