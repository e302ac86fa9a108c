//! # SFXI - Suffix-trie wildcard search
//!
//! SFXI answers wildcard term queries over an in-memory full-text/tag index:
//! `lit*` (prefix), `*lit` (suffix), `*lit*` (contains) and exact terms.
//! Fields declared `WITHSUFFIXTRIE` keep a suffix trie of their terms so
//! suffix and contains queries do not scan the whole dictionary.
//!
//! ## Architecture
//!
//! - [`index`] - Schema, term dictionaries, suffix tries, document lifecycle
//!   and the background garbage collector
//! - [`query`] - Pattern parsing, planning and bounded evaluation
//! - [`output`] - Result formatting
//! - [`utils`] - Tokenization and progress reporting
//! - [`error`] - Error types
//!
//! ## Quick Start
//!
//! ```
//! use sfxi::index::{SearchConfig, SearchIndex};
//! use sfxi::query::QueryEvaluator;
//!
//! let index = SearchIndex::from_schema_str("t TEXT WITHSUFFIXTRIE", SearchConfig::default()).unwrap();
//! index.add_document("doc1", &[("t", "world")]);
//! index.add_document("doc2", &[("t", "keyword")]);
//!
//! let result = QueryEvaluator::new(&index).search("*orl*").unwrap();
//! assert_eq!(result.keys, vec!["doc1"]);
//! ```
//!
//! ## Garbage collection
//!
//! Deleting the last document holding a term leaves stale trie nodes and an
//! empty posting list behind. [`index::GcHandle`] collects them periodically
//! from a snapshot, so queries keep running during the scan.

pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod utils;

pub use error::{Error, Result};
