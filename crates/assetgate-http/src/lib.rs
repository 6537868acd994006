//! AssetGate HTTP service layer.
//!
//! This crate implements the transport side of AssetGate:
//!
//! - **Router**: Extracts the operation from the `X-AssetGate-Target` header
//! - **Handler traits**: The boundary between HTTP and business logic, one for
//!   RPC operations and one for the storage data plane
//! - **Services**: Hyper `Service` implementations for the RPC surface and for
//!   signed `/storage/...` uploads and downloads
//! - **Response helpers**: JSON success/error response formatting

pub mod body;
pub mod dispatch;
pub mod response;
pub mod router;
pub mod service;
pub mod storage;

pub use body::AssetResponseBody;
pub use dispatch::{AssetHandler, StorageHandler};
pub use service::{AssetGateHttpConfig, AssetGateHttpService};
pub use storage::StorageHttpService;
