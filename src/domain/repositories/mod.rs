//! Repository trait definitions for the domain layer.
//!
//! Implementations live in `crate::infrastructure::persistence`; a mock is
//! generated via `mockall` for unit tests.
//!
//! # Testing
//!
//! See integration tests in `tests/repository_code_store.rs` for usage examples.

pub mod code_store;

pub use code_store::{CodeStore, StoreError};

#[cfg(test)]
pub use code_store::MockCodeStore;
