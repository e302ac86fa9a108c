use crate::index::field::FieldIndex;
use crate::index::types::DocId;
use crate::index::writer::SearchIndex;
use roaring::RoaringBitmap;

/// Read-side accessors
impl SearchIndex {
    pub fn fields(&self) -> &[FieldIndex] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldIndex> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn doc_count(&self) -> usize {
        self.docs.read().docs.len()
    }

    pub fn doc_id(&self, key: &str) -> Option<DocId> {
        self.docs.read().ids.get(key).copied()
    }

    /// Keys of the given documents, sorted. Ids deleted in the meantime are
    /// skipped.
    pub fn resolve_keys(&self, ids: &RoaringBitmap) -> Vec<String> {
        let docs = self.docs.read();
        let mut keys: Vec<String> = ids
            .iter()
            .filter_map(|id| docs.docs.get(&id).map(|d| d.key.clone()))
            .collect();
        keys.sort_unstable();
        keys
    }

    /// Terms a document holds in a field
    pub fn document_terms(&self, key: &str, field: &str) -> Option<Vec<String>> {
        let pos = self.field_position(field)?;
        let docs = self.docs.read();
        let id = docs.ids.get(key)?;
        docs.docs.get(id).map(|d| d.terms[pos].clone())
    }
}

#[cfg(test)]
mod tests {
    use crate::index::types::SearchConfig;
    use crate::index::writer::SearchIndex;
    use roaring::RoaringBitmap;

    #[test]
    fn test_resolve_keys_sorted() {
        let index = SearchIndex::from_schema_str("t TEXT", SearchConfig::default()).unwrap();
        let b = index.add_document("b", &[("t", "x")]);
        let a = index.add_document("a", &[("t", "x")]);
        let ids = RoaringBitmap::from_iter([a, b]);
        assert_eq!(index.resolve_keys(&ids), vec!["a", "b"]);

        index.delete_document("a");
        assert_eq!(index.resolve_keys(&ids), vec!["b"]);
    }

    #[test]
    fn test_document_terms() {
        let index = SearchIndex::from_schema_str("t TEXT", SearchConfig::default()).unwrap();
        index.add_document("doc", &[("t", "World hello")]);
        assert_eq!(
            index.document_terms("doc", "t"),
            Some(vec!["hello".to_string(), "world".to_string()])
        );
        assert_eq!(index.document_terms("doc", "nope"), None);
        assert!(index.field("t").is_some());
        assert_eq!(index.doc_id("doc"), Some(0));
    }
}
