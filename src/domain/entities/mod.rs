//! Core domain entities.
//!
//! - [`ShortUrlRecord`] - A stored code to URL mapping with access metadata

pub mod short_url;

pub use short_url::ShortUrlRecord;
