//! Domains module containing business logic organized by bounded contexts.
//!
//! Each subdomain represents a specific area of functionality within the
//! gateway:
//!
//! - **nocodb**: the downstream NocoDB REST client
//! - **tools**: the fixed operation registry dispatched over `/call`

pub mod nocodb;
pub mod tools;
