use crate::index::suffix_trie::{SuffixTrie, Term};
use crate::index::terms::TermDictionary;
use crate::index::types::{DocId, FieldSpec};
use ahash::AHashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// Mutable index state of one field, guarded by the field's lock
#[derive(Debug)]
pub struct FieldState {
    pub dictionary: TermDictionary,
    /// Present only for fields declared `WITHSUFFIXTRIE`
    pub trie: Option<SuffixTrie>,
    /// Live document count per term
    refs: AHashMap<Term, u32>,
    /// Terms whose count dropped to zero since the last collection
    pub pending_stale: usize,
}

impl FieldState {
    fn new(spec: &FieldSpec) -> Self {
        Self {
            dictionary: TermDictionary::new(),
            trie: spec
                .has_suffix_trie()
                .then(|| SuffixTrie::new(spec.min_suffix_len)),
            refs: AHashMap::new(),
            pending_stale: 0,
        }
    }

    /// Reuse the stored allocation of a known term
    fn intern(&self, term: &str) -> Term {
        match self.refs.get_key_value(term) {
            Some((known, _)) => known.clone(),
            None => Arc::from(term),
        }
    }

    fn add_term(&mut self, term: &str, doc_id: DocId) {
        let term = self.intern(term);
        self.dictionary.add(&term, doc_id);

        let first = {
            let count = self.refs.entry(term.clone()).or_insert(0);
            *count += 1;
            *count == 1
        };
        if first {
            if let Some(trie) = self.trie.as_mut() {
                trie.insert(&term);
            }
        }
    }

    fn remove_term(&mut self, term: &str, doc_id: DocId) {
        self.dictionary.remove(term, doc_id);

        let last = match self.refs.get_mut(term) {
            Some(count) => {
                *count -= 1;
                *count == 0
            }
            None => return,
        };
        if last {
            self.refs.remove(term);
            if let Some(trie) = self.trie.as_mut() {
                trie.mark_stale(term);
            }
            self.pending_stale += 1;
        }
    }

    /// Number of terms present in at least one document
    pub fn live_terms(&self) -> usize {
        self.refs.len()
    }

    pub fn doc_frequency(&self, term: &str) -> u32 {
        self.refs.get(term).copied().unwrap_or(0)
    }
}

/// A declared field together with its index state
#[derive(Debug)]
pub struct FieldIndex {
    spec: FieldSpec,
    state: RwLock<FieldState>,
}

impl FieldIndex {
    pub fn new(spec: FieldSpec) -> Self {
        let state = RwLock::new(FieldState::new(&spec));
        Self { spec, state }
    }

    pub fn spec(&self) -> &FieldSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn read(&self) -> RwLockReadGuard<'_, FieldState> {
        self.state.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, FieldState> {
        self.state.write()
    }

    /// Apply one document's term changes under a single exclusive window
    pub fn apply(&self, doc_id: DocId, removed: &[&str], added: &[&str]) {
        let mut state = self.state.write();
        for term in removed {
            state.remove_term(term, doc_id);
        }
        for term in added {
            state.add_term(term, doc_id);
        }
    }
}
