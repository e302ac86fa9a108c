#![no_main]

use libfuzzer_sys::fuzz_target;
use sfxi::index::suffix_trie::{SuffixTrie, Term};
use std::sync::Arc;

fuzz_target!(|data: (Vec<String>, Vec<bool>)| {
    // Insert, mark some terms stale, sweep, then check live terms survived
    let (terms, stale) = data;
    let mut trie = SuffixTrie::new(1);
    for term in &terms {
        let term: Term = Arc::from(term.as_str());
        trie.insert(&term);
    }
    let mut dropped = Vec::new();
    for (term, drop) in terms.iter().zip(stale) {
        if drop {
            trie.mark_stale(term);
            dropped.push(term);
        }
    }

    let removals = trie.collect_prunable();
    trie.apply_removals(&removals);

    for term in &terms {
        if !term.is_empty() && !dropped.contains(&term) {
            assert!(trie.contains_term(term));
        }
    }
});
