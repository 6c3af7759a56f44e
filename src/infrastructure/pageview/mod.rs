//! Anonymized page-view audit trail.
//!
//! - [`FilePageViewTracker`] - Daily log files with salted visitor hashes

mod tracker;

pub use tracker::{
    DEFAULT_SALT_FILE, FALLBACK_USER_AGENT, FilePageViewTracker, fingerprint, generate_salt,
};
