//! Utility functions for code generation, URL processing, and storage errors.
//!
//! - [`code_generator`] - Random short code generation
//! - [`url_normalizer`] - URL repair and validation
//! - [`db_error`] - Database error classification

pub mod code_generator;
pub mod db_error;
pub mod url_normalizer;
