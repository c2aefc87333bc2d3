//! NocoDB domain module.
//!
//! This module wraps the downstream NocoDB REST surface behind a typed
//! client. The client owns no state beyond the base URL, the credential and
//! a shared HTTP connection pool; it performs no caching and no retries -
//! a failed call surfaces immediately to the caller.

mod client;
mod error;

pub use client::NocoClient;
pub use error::NocoError;
