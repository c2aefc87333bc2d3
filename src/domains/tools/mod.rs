//! Tools domain module.
//!
//! This module holds the fixed operation registry exposed over `/call`.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per family)
//! - `registry.rs` - Operation identifiers, the fixed table, and dispatch
//! - `envelope.rs` - The normalized `{success, ...}` response shape
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create the definition in `definitions/` (params, NAME, execute)
//! 2. Export it in `definitions/mod.rs`
//! 3. Add a `ToolName` variant and wire it into the registry table and
//!    dispatch match - the compiler walks you through the rest.

pub mod definitions;
mod envelope;
mod error;
mod registry;

pub use envelope::{ToolOutput, now_rfc3339};
pub use error::ToolError;
pub use registry::{ToolDescriptor, ToolName, ToolRegistry};
