//! Utility functions shared by the index and the query side.
//!
//! ## Modules
//!
//! - [`tokenizer`] - Field value and query literal normalization
//! - [`progress`] - Progress bar that compiles away without the `progress` feature

pub mod progress;
pub mod tokenizer;

pub use tokenizer::*;
