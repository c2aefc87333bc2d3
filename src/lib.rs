//! NocoDB Tool Gateway Library
//!
//! This crate exposes a fixed registry of NocoDB operations over HTTP,
//! with per-client rate limiting, a lazily initialized downstream client,
//! and reaction analytics aggregation.
//!
//! # Architecture
//!
//! - **core**: configuration, error handling, rate limiting, and the HTTP
//!   request gateway
//! - **domains**: business logic organized by bounded contexts
//!   - **nocodb**: the downstream REST client adapter
//!   - **tools**: the operation registry and its handlers
//!
//! # Example
//!
//! ```rust,no_run
//! use nocodb_gateway::core::{Config, Gateway};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     Gateway::new(config).run().await?;
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, Gateway, Result};
