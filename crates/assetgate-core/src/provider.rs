//! The AssetGate provider.
//!
//! [`AssetGateProvider`] owns the collaborators (record store, object
//! store) and the configuration, and exposes one `handle_*` method per RPC
//! operation. The operations live in the [`crate::ops`] submodules.

use std::sync::Arc;

use assetgate_auth::UrlSigner;

use crate::config::AssetGateConfig;
use crate::finalize::FinalizePipeline;
use crate::state::{InMemoryRecordStore, RecordStore};
use crate::storage::{InMemoryObjectStore, ObjectStore};
use crate::tickets::TicketStore;

/// The main AssetGate provider.
///
/// # Examples
///
/// ```
/// use assetgate_core::AssetGateProvider;
/// use assetgate_core::config::AssetGateConfig;
///
/// let (provider, _objects) = AssetGateProvider::in_memory(AssetGateConfig::default());
/// assert_eq!(provider.config().storage_bucket, "private");
/// ```
#[derive(Debug)]
pub struct AssetGateProvider {
    /// Records, tickets, shares and audits.
    pub(crate) records: Arc<dyn RecordStore>,
    /// Asset bytes and signed URLs.
    pub(crate) objects: Arc<dyn ObjectStore>,
    /// Ticket issuance and consumption.
    pub(crate) tickets: TicketStore,
    /// Finalize verification.
    pub(crate) finalize: FinalizePipeline,
    /// Provider configuration.
    pub(crate) config: Arc<AssetGateConfig>,
}

impl AssetGateProvider {
    /// Create a provider over explicit collaborators.
    #[must_use]
    pub fn new(
        config: AssetGateConfig,
        records: Arc<dyn RecordStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        let config = Arc::new(config);
        let tickets = TicketStore::new(
            Arc::clone(&records),
            Arc::clone(&objects),
            Arc::clone(&config),
        );
        let finalize = FinalizePipeline::new(
            Arc::clone(&records),
            Arc::clone(&objects),
            tickets.clone(),
            config.sniff_prefix_len,
        );
        Self {
            records,
            objects,
            tickets,
            finalize,
            config,
        }
    }

    /// Create a provider backed by the in-memory stores.
    ///
    /// The user directory is seeded from `config.user_directory`. The object
    /// store is returned as well so the caller can serve its data plane.
    #[must_use]
    pub fn in_memory(config: AssetGateConfig) -> (Self, Arc<InMemoryObjectStore>) {
        let records = InMemoryRecordStore::new();
        let users = records.register_users(&config.user_directory);
        tracing::debug!(users, "seeded user directory");

        let objects = Arc::new(InMemoryObjectStore::new(
            config.storage_bucket.clone(),
            config.public_base_url.clone(),
            UrlSigner::new(&config.storage_signing_secret),
            config.max_memory_object_size,
        ));
        let provider = Self::new(config, Arc::new(records), objects.clone());
        (provider, objects)
    }

    /// Returns the record store.
    #[must_use]
    pub fn records(&self) -> &dyn RecordStore {
        self.records.as_ref()
    }

    /// Returns the provider configuration.
    #[must_use]
    pub fn config(&self) -> &AssetGateConfig {
        &self.config
    }
}
