//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the gateway:
//! configuration, error handling, rate limiting, and the HTTP-facing
//! request gateway with its process lifecycle.

pub mod config;
pub mod error;
pub mod gateway;
pub mod rate_limit;

pub use config::Config;
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use rate_limit::RateLimiter;
