use crate::index::suffix_trie::Term;
use crate::index::types::DocId;
use roaring::RoaringBitmap;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Sorted term dictionary of a field: term -> posting list
///
/// Posting lists are updated eagerly. A list that becomes empty keeps its
/// entry until the collector reclaims it, so the entry count can lag behind
/// the live term count.
#[derive(Debug, Clone, Default)]
pub struct TermDictionary {
    postings: BTreeMap<Term, RoaringBitmap>,
}

impl TermDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a posting, returns true if the list was previously empty or absent
    pub fn add(&mut self, term: &Term, doc_id: DocId) -> bool {
        match self.postings.get_mut(term) {
            Some(list) => {
                let was_empty = list.is_empty();
                list.insert(doc_id);
                was_empty
            }
            None => {
                self.postings
                    .insert(term.clone(), RoaringBitmap::from_iter([doc_id]));
                true
            }
        }
    }

    /// Remove a posting, returns true if the list became empty
    pub fn remove(&mut self, term: &str, doc_id: DocId) -> bool {
        match self.postings.get_mut(term) {
            Some(list) => list.remove(doc_id) && list.is_empty(),
            None => false,
        }
    }

    pub fn postings(&self, term: &str) -> Option<&RoaringBitmap> {
        self.postings.get(term).filter(|list| !list.is_empty())
    }

    /// Live entries whose term starts with `prefix`, in term order
    pub fn prefix_iter<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a Term, &'a RoaringBitmap)> + 'a {
        self.postings
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(term, _)| term.starts_with(prefix))
            .filter(|(_, list)| !list.is_empty())
    }

    /// Live entries in term order
    pub fn iter(&self) -> impl Iterator<Item = (&Term, &RoaringBitmap)> {
        self.postings.iter().filter(|(_, list)| !list.is_empty())
    }

    /// Entries whose posting list is empty
    pub fn empty_terms(&self) -> Vec<Term> {
        self.postings
            .iter()
            .filter(|(_, list)| list.is_empty())
            .map(|(term, _)| term.clone())
            .collect()
    }

    /// Drop the given entries if they are still empty.
    ///
    /// Returns the number of entries dropped.
    pub fn reclaim(&mut self, terms: &[Term]) -> usize {
        let mut dropped = 0;
        for term in terms {
            if self.postings.get(term).is_some_and(|list| list.is_empty()) {
                self.postings.remove(term);
                dropped += 1;
            }
        }
        dropped
    }

    /// Entries, empty ones included
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Entries with at least one posting
    pub fn live_len(&self) -> usize {
        self.iter().count()
    }
}
