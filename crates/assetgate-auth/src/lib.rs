//! Request authentication for AssetGate.
//!
//! Two concerns live here:
//!
//! - Resolving the caller of an RPC request from its `Authorization: Bearer`
//!   header through an [`IdentityProvider`], with an optional `x-user-id`
//!   fallback for local development.
//! - Signing and verifying the short-lived storage URLs handed to clients
//!   for uploading and downloading bytes.
//!
//! # Modules
//!
//! - [`caller`] - Caller resolution from request headers
//! - [`error`] - Authentication error types
//! - [`identity`] - Identity provider trait and implementations
//! - [`presigned`] - HMAC-signed storage URLs

pub mod caller;
pub mod error;
pub mod identity;
pub mod presigned;

pub use caller::resolve_caller;
pub use error::AuthError;
pub use identity::{IdentityProvider, RemoteIdentityProvider, StaticIdentityProvider};
pub use presigned::UrlSigner;
