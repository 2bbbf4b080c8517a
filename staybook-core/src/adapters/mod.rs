//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the StoreGateway port
//! - An in-memory store for tests and dry runs

pub mod duckdb;
pub mod memory;
