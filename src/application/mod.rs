//! Application layer services.
//!
//! Services coordinate the code store, URL normalization and garbage policy.
//! HTTP handlers and the admin CLI only talk to this layer.
//!
//! # Available Services
//!
//! - [`services::allocator::CodeAllocator`] - Unique short code assignment backed by a candidate pool
//! - [`services::link_service::LinkService`] - Shorten and resolve operations
//! - [`services::sweeper::Sweeper`] - Periodic repair and garbage removal

pub mod services;
