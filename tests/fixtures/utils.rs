// Shared helpers for integration tests
#![allow(dead_code)]

use sfxi::index::{SearchConfig, SearchIndex, dump_suffix_trie};
use sfxi::query::QueryEvaluator;

/// Config with a collector that sweeps on every run
pub fn eager_gc_config() -> SearchConfig {
    let mut config = SearchConfig::default();
    config.gc.clean_threshold = 0;
    config
}

pub fn index_with(schema: &str, config: SearchConfig) -> SearchIndex {
    SearchIndex::from_schema_str(schema, config).expect("valid schema")
}

/// Index documents with a single field `t`
pub fn index_docs(schema: &str, docs: &[(&str, &str)]) -> SearchIndex {
    let index = index_with(schema, SearchConfig::default());
    for (key, value) in docs {
        index.add_document(key, &[("t", value)]);
    }
    index
}

pub fn search_keys(index: &SearchIndex, query: &str) -> Vec<String> {
    QueryEvaluator::new(index)
        .search(query)
        .unwrap_or_else(|e| panic!("query `{query}` failed: {e}"))
        .keys
}

pub fn dump(index: &SearchIndex, field: Option<&str>) -> Vec<String> {
    let args: Vec<&str> = field.into_iter().collect();
    dump_suffix_trie(index, &args).expect("dump")
}

pub fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
