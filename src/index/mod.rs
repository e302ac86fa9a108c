pub mod build;
pub mod debug;
pub mod field;
pub mod gc;
pub mod reader;
pub mod schema;
pub mod stats;
pub mod suffix_trie;
pub mod terms;
pub mod types;
pub mod writer;

pub use debug::dump_suffix_trie;
pub use gc::{GcHandle, GcPhase, GcReport, GcStats};
pub use stats::{FieldStats, IndexStats};
pub use types::*;
pub use writer::SearchIndex;
