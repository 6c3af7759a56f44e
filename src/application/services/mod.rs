//! Business logic services for the application layer.

pub mod allocator;
pub mod link_service;
pub mod sweeper;

pub use allocator::{AllocationError, AllocatorSettings, CandidatePool, CodeAllocator};
pub use link_service::{LinkService, ShortenedLink};
pub use sweeper::{CleanupOptions, SweepError, SweepReport, Sweeper, SweeperState};
