//! Code store implementations.
//!
//! - [`PgCodeStore`] - PostgreSQL storage through SQLx
//! - [`InMemoryCodeStore`] - Process-local map with the same contract

pub mod memory_code_store;
pub mod pg_code_store;

pub use memory_code_store::InMemoryCodeStore;
pub use pg_code_store::PgCodeStore;
