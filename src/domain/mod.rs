//! Domain layer containing business entities and logic.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures
//! - [`repositories`] - Data access trait definitions
//! - [`garbage`] - Pure classification of records eligible for deletion
//! - [`pageview_event`] - Page-view event model and sink trait
//! - [`pageview_worker`] - Asynchronous page-view processing worker
//!
//! # Design Principles
//!
//! - Domain layer has no dependencies on infrastructure or presentation layers
//! - Repository traits define contracts implemented by infrastructure layer
//! - Business logic is encapsulated in services (see [`crate::application::services`])
//!
//! # Page-View Flow
//!
//! 1. HTTP handler resolves a short code
//! 2. [`pageview_event::PageViewEvent`] is sent to an async channel
//! 3. [`pageview_worker::run_pageview_worker`] hands events to a sink
//! 4. The file sink appends an anonymized line to the daily log

pub mod entities;
pub mod garbage;
pub mod pageview_event;
pub mod pageview_worker;
pub mod repositories;
