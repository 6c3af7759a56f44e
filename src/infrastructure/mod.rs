//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - Code store implementations
//! - [`pageview`] - File-based anonymized page-view log

pub mod pageview;
pub mod persistence;
