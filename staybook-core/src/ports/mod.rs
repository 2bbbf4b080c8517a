//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core pipeline
//! depends only on these traits, not on concrete implementations.

mod store;

pub use store::{AppendReport, SchemaStatus, StoreGateway};
