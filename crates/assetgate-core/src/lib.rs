//! AssetGate business logic.
//!
//! Clients upload bytes straight to storage with a signed URL, then ask the
//! server to certify what landed there. This crate owns that protocol:
//! single-use upload tickets, content sniffing and SHA-256 verification,
//! and the versioned asset record every mutation must go through.
//!
//! # Architecture
//!
//! ```text
//! assetgate-http (routing, auth, JSON)
//!        |
//!        v
//! AssetGateHandler (AssetHandler impl)
//!        |
//!        v
//! AssetGateProvider (handle_* per operation)
//!        |
//!        +--> TicketStore / FinalizePipeline / MutationGuard
//!        |
//!        v
//! RecordStore (atomic conditional writes)   ObjectStore (bytes, signed URLs)
//! ```

pub mod checksums;
pub mod config;
pub mod error;
pub mod finalize;
pub mod guard;
pub mod handler;
mod ops;
pub mod provider;
pub mod reaper;
pub mod sniff;
pub mod state;
pub mod storage;
pub mod tickets;
pub mod utils;

pub use config::AssetGateConfig;
pub use handler::{AssetGateHandler, ObjectStoreHandler};
pub use provider::AssetGateProvider;
pub use reaper::spawn_reaper;
