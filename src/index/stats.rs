use crate::index::gc::{GcPhase, GcStats};
use crate::index::suffix_trie::TrieStats;
use crate::index::writer::SearchIndex;
use serde::Serialize;

/// Per-field index statistics
#[derive(Debug, Clone, Serialize)]
pub struct FieldStats {
    pub name: String,
    pub kind: &'static str,
    /// Terms present in at least one document
    pub terms: usize,
    /// Dictionary entries, including empty ones awaiting collection
    pub dictionary_entries: usize,
    pub pending_stale: usize,
    pub suffix_trie: Option<TrieStats>,
}

/// Whole-index statistics
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub doc_count: usize,
    pub fields: Vec<FieldStats>,
    pub gc_phase: GcPhase,
    pub gc: GcStats,
}

impl SearchIndex {
    pub fn stats(&self) -> IndexStats {
        let fields = self
            .fields()
            .iter()
            .map(|field| {
                let state = field.read();
                FieldStats {
                    name: field.name().to_string(),
                    kind: field.spec().kind.as_str(),
                    terms: state.live_terms(),
                    dictionary_entries: state.dictionary.len(),
                    pending_stale: state.pending_stale,
                    suffix_trie: state.trie.as_ref().map(|t| t.stats()),
                }
            })
            .collect();

        IndexStats {
            doc_count: self.doc_count(),
            fields,
            gc_phase: self.gc_phase(),
            gc: self.gc_stats(),
        }
    }
}

/// Display index statistics
pub fn print_stats(stats: &IndexStats) {
    println!("Index Statistics");
    println!("================");
    println!();
    println!("Document count:   {}", stats.doc_count);
    println!("Field count:      {}", stats.fields.len());

    for field in &stats.fields {
        println!();
        println!("Field `{}` ({})", field.name, field.kind);
        println!("  Terms:            {}", field.terms);
        println!("  Dictionary:       {}", field.dictionary_entries);
        println!("  Pending stale:    {}", field.pending_stale);
        match &field.suffix_trie {
            Some(trie) => {
                println!("  Trie nodes:       {}", trie.node_count);
                println!("  Stored suffixes:  {}", trie.suffix_count);
                println!("  Vacant nodes:     {}", trie.vacant_nodes);
                println!("  Free slots:       {}", trie.free_slots);
            }
            None => println!("  Suffix trie:      none"),
        }
    }

    println!();
    println!("GC phase:         {}", stats.gc_phase.as_str());
    println!("GC runs:          {} ({} skipped)", stats.gc.runs, stats.gc.skipped);
    println!("Nodes reclaimed:  {}", stats.gc.nodes_removed);
    println!("Terms reclaimed:  {}", stats.gc.terms_reclaimed);
}

#[cfg(test)]
mod tests {
    use crate::index::types::SearchConfig;
    use crate::index::writer::SearchIndex;

    #[test]
    fn test_stats_reflect_lifecycle() {
        let index =
            SearchIndex::from_schema_str("t TEXT WITHSUFFIXTRIE g TAG", SearchConfig::default())
                .unwrap();
        index.add_document("d", &[("t", "hello"), ("g", "red")]);

        let stats = index.stats();
        assert_eq!(stats.doc_count, 1);
        assert_eq!(stats.fields[0].terms, 1);
        assert_eq!(stats.fields[0].suffix_trie.unwrap().suffix_count, 4);
        assert!(stats.fields[1].suffix_trie.is_none());

        index.delete_document("d");
        let stats = index.stats();
        assert_eq!(stats.fields[0].terms, 0);
        assert_eq!(stats.fields[0].dictionary_entries, 1);
        assert_eq!(stats.fields[0].pending_stale, 1);
        assert!(stats.fields[0].suffix_trie.unwrap().vacant_nodes > 0);

        index.force_gc();
        let stats = index.stats();
        assert_eq!(stats.fields[0].dictionary_entries, 0);
        assert_eq!(stats.gc.runs, 1);
    }
}
