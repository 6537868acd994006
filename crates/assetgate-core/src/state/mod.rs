//! Persisted AssetGate state.
//!
//! - [`AssetRecord`] -- the object record and its versioned mutations
//! - [`UploadTicket`] -- single-use upload authorization
//! - [`AssetShare`] / [`DownloadAudit`] -- ACL edges and the download log
//! - [`RecordStore`] -- the atomic conditional operations the core relies on
//! - [`InMemoryRecordStore`] -- a `DashMap`-backed implementation
//!
//! # Thread Safety
//!
//! Every cross-request guarantee (single ticket consumption, version-gated
//! mutation) is a single conditional operation inside the store. The core
//! never does read-modify-write on its own.

pub(crate) mod asset;
pub(crate) mod memory;
pub(crate) mod share;
pub(crate) mod store;
pub(crate) mod ticket;

pub use asset::{AssetRecord, RecordChange};
pub use memory::InMemoryRecordStore;
pub use share::{AssetShare, DownloadAudit};
pub use store::{AssetPage, ListQuery, RecordError, RecordStore, TicketConsumption};
pub use ticket::UploadTicket;
